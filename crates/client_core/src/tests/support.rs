//! In-memory post collection that records every call made against it.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{PageResult, Post, PostId},
    protocol::BlogListResponse,
};
use tokio::sync::Notify;

use crate::{BlogApi, ClientError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    List { page: u32, per_page: u32 },
    Get(PostId),
    Create { title: String, content: String },
    Update { id: PostId, title: String, content: String },
    Delete(PostId),
}

struct FakeServer {
    /// Newest first, like the server's ordering.
    posts: Vec<Post>,
    next_id: i64,
    calls: Vec<ApiCall>,
    failures: VecDeque<u16>,
    list_failures: VecDeque<u16>,
}

struct Gate {
    entered: Notify,
    release: Notify,
    /// Calls that still park; later ones pass straight through.
    remaining: AtomicUsize,
}

impl Gate {
    fn parking(calls: usize) -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
            remaining: AtomicUsize::new(calls),
        }
    }
}

pub(crate) struct RecordingApi {
    server: Mutex<FakeServer>,
    gate: Option<Gate>,
}

pub(crate) fn post(id: i64, title: &str) -> Post {
    Post {
        id: PostId(id),
        title: title.to_string(),
        content: format!("{title} content"),
        date: format!("Thu, 15 Oct 2026 10:{:02}:00 GMT", id % 60),
    }
}

impl RecordingApi {
    /// Seeds `count` posts with ids `1..=count`; id `count` is listed first.
    pub(crate) fn with_posts(count: i64) -> Arc<Self> {
        Arc::new(Self::build(count, None))
    }

    /// Like `with_posts`, but `list` and `get` park until `release` is called.
    pub(crate) fn gated(count: i64) -> Arc<Self> {
        Arc::new(Self::build(count, Some(Gate::parking(usize::MAX))))
    }

    /// Only the first `list` or `get` parks.
    pub(crate) fn gated_once(count: i64) -> Arc<Self> {
        Arc::new(Self::build(count, Some(Gate::parking(1))))
    }

    fn build(count: i64, gate: Option<Gate>) -> Self {
        let posts = (1..=count)
            .rev()
            .map(|id| post(id, &format!("post {id}")))
            .collect();
        Self {
            server: Mutex::new(FakeServer {
                posts,
                next_id: count + 1,
                calls: Vec::new(),
                failures: VecDeque::new(),
                list_failures: VecDeque::new(),
            }),
            gate,
        }
    }

    /// The next call answers with `status` instead of touching the data.
    pub(crate) fn fail_next(&self, status: u16) {
        self.server.lock().unwrap().failures.push_back(status);
    }

    /// The next `list` answers with `status`; other calls are unaffected.
    pub(crate) fn fail_next_list(&self, status: u16) {
        self.server.lock().unwrap().list_failures.push_back(status);
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.server.lock().unwrap().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.server.lock().unwrap().calls.clear();
    }

    pub(crate) fn remove_directly(&self, id: PostId) {
        self.server.lock().unwrap().posts.retain(|p| p.id != id);
    }

    pub(crate) async fn wait_entered(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notified().await;
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.release.notify_one();
        }
    }

    async fn pass_gate(&self) {
        let Some(gate) = &self.gate else {
            return;
        };
        let parks = gate
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if parks {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }

    fn failure(status: u16) -> ClientError {
        ClientError::Network {
            status: Some(status),
            message: format!("server returned HTTP {status}"),
        }
    }

    fn record(&self, call: ApiCall) -> Result<(), ClientError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push(call);
        match server.failures.pop_front() {
            Some(status) => Err(Self::failure(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlogApi for RecordingApi {
    async fn list(&self, page: u32, per_page: u32) -> Result<PageResult, ClientError> {
        self.record(ApiCall::List { page, per_page })?;
        let list_failure = self.server.lock().unwrap().list_failures.pop_front();
        if let Some(status) = list_failure {
            return Err(Self::failure(status));
        }
        self.pass_gate().await;

        let server = self.server.lock().unwrap();
        let total = server.posts.len() as u64;
        let pages = total.div_ceil(per_page as u64) as u32;
        let start = (page.saturating_sub(1) * per_page) as usize;
        let blogs = server
            .posts
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok(PageResult::from(BlogListResponse {
            blogs,
            current_page: page,
            pages,
            total,
            per_page,
            has_next: page < pages,
            has_prev: page > 1,
        }))
    }

    async fn get(&self, id: PostId) -> Result<Post, ClientError> {
        self.record(ApiCall::Get(id))?;
        self.pass_gate().await;

        let server = self.server.lock().unwrap();
        server
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ClientError::NotFound(id))
    }

    async fn create(&self, title: &str, content: &str) -> Result<Post, ClientError> {
        self.record(ApiCall::Create {
            title: title.to_string(),
            content: content.to_string(),
        })?;

        let mut server = self.server.lock().unwrap();
        let id = server.next_id;
        server.next_id += 1;
        let mut created = post(id, title);
        created.content = content.to_string();
        server.posts.insert(0, created.clone());
        Ok(created)
    }

    async fn update(&self, id: PostId, title: &str, content: &str) -> Result<Post, ClientError> {
        self.record(ApiCall::Update {
            id,
            title: title.to_string(),
            content: content.to_string(),
        })?;

        let mut server = self.server.lock().unwrap();
        let Some(existing) = server.posts.iter_mut().find(|p| p.id == id) else {
            return Err(ClientError::Network {
                status: Some(404),
                message: "server returned HTTP 404".into(),
            });
        };
        existing.title = title.to_string();
        existing.content = content.to_string();
        Ok(existing.clone())
    }

    async fn delete(&self, id: PostId) -> Result<(), ClientError> {
        self.record(ApiCall::Delete(id))?;

        let mut server = self.server.lock().unwrap();
        let before = server.posts.len();
        server.posts.retain(|p| p.id != id);
        if server.posts.len() == before {
            return Err(ClientError::Network {
                status: Some(404),
                message: "server returned HTTP 404".into(),
            });
        }
        Ok(())
    }
}
