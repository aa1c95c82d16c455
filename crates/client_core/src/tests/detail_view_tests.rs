use super::*;
use crate::test_support::{post, ApiCall, RecordingApi};
use shared::error::ErrorCode;

#[tokio::test]
async fn load_finds_existing_post() {
    let api = RecordingApi::with_posts(3);
    let detail = DetailViewController::new(api.clone());
    assert_eq!(detail.snapshot().await, DetailState::Idle);

    let state = detail.load(PostId(2)).await;

    assert_eq!(state, Some(DetailState::Found(post(2, "post 2"))));
    assert_eq!(detail.snapshot().await, DetailState::Found(post(2, "post 2")));
    assert_eq!(api.calls(), vec![ApiCall::Get(PostId(2))]);
}

#[tokio::test]
async fn missing_post_becomes_not_found() {
    let api = RecordingApi::with_posts(1);
    let detail = DetailViewController::new(api);

    detail.load(PostId(404)).await;

    assert_eq!(detail.snapshot().await, DetailState::NotFound(PostId(404)));
}

#[tokio::test]
async fn transport_failure_becomes_failed_state() {
    let api = RecordingApi::with_posts(1);
    let detail = DetailViewController::new(api.clone());

    api.fail_next(502);
    detail.load(PostId(1)).await;

    match detail.snapshot().await {
        DetailState::Failed(info) => {
            assert_eq!(info.code, ErrorCode::Network);
            assert_eq!(info.status, Some(502));
            assert!(info.message.starts_with("failed to load post"));
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn every_load_hits_the_network() {
    let api = RecordingApi::with_posts(2);
    let detail = DetailViewController::new(api.clone());

    detail.load(PostId(1)).await;
    detail.load(PostId(1)).await;

    assert_eq!(
        api.calls(),
        vec![ApiCall::Get(PostId(1)), ApiCall::Get(PostId(1))]
    );
}

#[tokio::test]
async fn result_arriving_after_unmount_is_dropped() {
    let api = RecordingApi::gated(2);
    let detail = Arc::new(DetailViewController::new(api.clone()));

    let pending = {
        let detail = detail.clone();
        tokio::spawn(async move { detail.load(PostId(1)).await })
    };
    api.wait_entered().await;
    assert_eq!(detail.snapshot().await, DetailState::Loading(PostId(1)));

    detail.unmount().await;
    api.release();

    assert_eq!(pending.await.expect("join"), None);
    assert_eq!(detail.snapshot().await, DetailState::Idle);
}

#[tokio::test]
async fn newer_load_supersedes_pending_one() {
    let api = RecordingApi::gated_once(2);
    let detail = Arc::new(DetailViewController::new(api.clone()));

    let pending = {
        let detail = detail.clone();
        tokio::spawn(async move { detail.load(PostId(1)).await })
    };
    api.wait_entered().await;

    let latest = detail.load(PostId(2)).await;
    assert_eq!(latest, Some(DetailState::Found(post(2, "post 2"))));

    api.release();

    assert_eq!(pending.await.expect("join"), None);
    assert_eq!(detail.snapshot().await, DetailState::Found(post(2, "post 2")));
    assert_eq!(
        api.calls(),
        vec![ApiCall::Get(PostId(1)), ApiCall::Get(PostId(2))]
    );
}
