//! Local view of the current page of posts, kept in step with the server.
//!
//! Creates and deletes are followed by a full refetch because the server owns
//! ordering and pagination. Updates are the one path patched locally: the
//! server returns the canonical object and its position cannot change.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::{
    domain::{PageResult, Post, PostDraft, PostId},
    error::ErrorInfo,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, Operation},
    BlogApi,
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub page: PageResult,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    LoadingChanged(bool),
    PageLoaded { current_page: u32 },
    PostReplaced(PostId),
    ErrorRecorded(ErrorInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Asks the user before a delete is dispatched. There is no server-side undo.
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// `post` is the cached copy when the id is on the current page.
    async fn confirm_delete(&self, id: PostId, post: Option<&Post>) -> bool;
}

/// Confirms every delete. For callers that already asked (e.g. `--yes`).
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmation for AlwaysConfirm {
    async fn confirm_delete(&self, _id: PostId, _post: Option<&Post>) -> bool {
        true
    }
}

struct ListState {
    page: PageResult,
    error: Option<ErrorInfo>,
}

/// Holds the loading flag for one public operation and releases it on drop,
/// whichever way the operation exits.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    events: &'a broadcast::Sender<SyncEvent>,
}

impl<'a> InFlight<'a> {
    fn acquire(
        flag: &'a AtomicBool,
        events: &'a broadcast::Sender<SyncEvent>,
    ) -> Result<Self, ClientError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::Busy)?;
        let _ = events.send(SyncEvent::LoadingChanged(true));
        Ok(Self { flag, events })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        let _ = self.events.send(SyncEvent::LoadingChanged(false));
    }
}

pub struct ListSyncController {
    api: Arc<dyn BlogApi>,
    per_page: u32,
    loading: AtomicBool,
    state: Mutex<ListState>,
    events: broadcast::Sender<SyncEvent>,
}

impl ListSyncController {
    pub fn new(api: Arc<dyn BlogApi>, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            per_page,
            loading: AtomicBool::new(false),
            state: Mutex::new(ListState {
                page: PageResult::empty(per_page),
                error: None,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> SyncState {
        let guard = self.state.lock().await;
        SyncState {
            page: guard.page.clone(),
            loading: self.is_loading(),
            error: guard.error.clone(),
        }
    }

    pub async fn current_page(&self) -> u32 {
        self.state.lock().await.page.current_page
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }

    pub async fn refresh(&self, page: u32) -> Result<(), ClientError> {
        let _in_flight = self.begin()?;
        self.fetch_page(page).await
    }

    pub async fn refresh_current(&self) -> Result<(), ClientError> {
        let page = self.current_page().await;
        self.refresh(page).await
    }

    /// Creates a post and reloads page 1, where the server places new posts.
    ///
    /// Returns the created post even when the reload fails; that failure is
    /// recorded in state.
    pub async fn create(&self, draft: &PostDraft) -> Result<Post, ClientError> {
        let _in_flight = self.begin()?;
        self.validate(draft, Operation::CreatePost).await?;

        let post = match self.api.create(&draft.title, &draft.content).await {
            Ok(post) => post,
            Err(err) => {
                self.record_failure(Operation::CreatePost, &err).await;
                return Err(err);
            }
        };
        info!(post_id = %post.id, "post created");

        let _ = self.fetch_page(1).await;
        Ok(post)
    }

    pub async fn update(&self, id: PostId, draft: &PostDraft) -> Result<Post, ClientError> {
        let _in_flight = self.begin()?;
        self.validate(draft, Operation::UpdatePost).await?;

        let post = match self.api.update(id, &draft.title, &draft.content).await {
            Ok(post) => post,
            Err(err) => {
                self.record_failure(Operation::UpdatePost, &err).await;
                return Err(err);
            }
        };
        info!(post_id = %id, "post updated");

        let replaced = {
            let mut guard = self.state.lock().await;
            guard.error = None;
            guard.page.replace_item(post.clone())
        };
        if replaced {
            let _ = self.events.send(SyncEvent::PostReplaced(id));
        } else {
            debug!(post_id = %id, "updated post is not on the current page");
        }
        Ok(post)
    }

    /// Deletes after confirmation, then reloads the current page. If that
    /// leaves a non-first page empty, steps back one page.
    ///
    /// Once the server has deleted the post this returns `Deleted`, even when
    /// a reload fails.
    pub async fn delete(
        &self,
        id: PostId,
        confirmation: &dyn Confirmation,
    ) -> Result<DeleteOutcome, ClientError> {
        if self.is_loading() {
            return Err(ClientError::Busy);
        }
        let cached = self.state.lock().await.page.find(id).cloned();
        if !confirmation.confirm_delete(id, cached.as_ref()).await {
            debug!(post_id = %id, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let _in_flight = self.begin()?;
        let page = self.current_page().await;
        if let Err(err) = self.api.delete(id).await {
            self.record_failure(Operation::DeletePost, &err).await;
            return Err(err);
        }
        info!(post_id = %id, "post deleted");

        // Reload failures are recorded in state; the post is gone either way.
        if self.fetch_page(page).await.is_err() {
            return Ok(DeleteOutcome::Deleted);
        }

        let (emptied, current) = {
            let guard = self.state.lock().await;
            (guard.page.is_empty(), guard.page.current_page)
        };
        if emptied && current > 1 {
            debug!(page = current, "current page emptied by delete; stepping back");
            let _ = self.fetch_page(current - 1).await;
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Returns false without touching state when `target` is outside
    /// `1..=total_pages` or already current.
    pub async fn change_page(&self, target: u32) -> Result<bool, ClientError> {
        {
            let guard = self.state.lock().await;
            if !guard.page.contains_page(target) || guard.page.current_page == target {
                return Ok(false);
            }
        }
        self.refresh(target).await?;
        Ok(true)
    }

    pub async fn next_page(&self) -> Result<bool, ClientError> {
        let current = self.current_page().await;
        self.change_page(current.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> Result<bool, ClientError> {
        let current = self.current_page().await;
        self.change_page(current.saturating_sub(1)).await
    }

    fn begin(&self) -> Result<InFlight<'_>, ClientError> {
        InFlight::acquire(&self.loading, &self.events)
    }

    async fn validate(&self, draft: &PostDraft, operation: Operation) -> Result<(), ClientError> {
        if let Err(err) = draft.validate() {
            let err = ClientError::from(err);
            self.record_failure(operation, &err).await;
            return Err(err);
        }
        Ok(())
    }

    /// Must run under an acquired `InFlight`.
    async fn fetch_page(&self, page: u32) -> Result<(), ClientError> {
        let page = page.max(1);
        match self.api.list(page, self.per_page).await {
            Ok(result) => {
                let current_page = result.current_page;
                {
                    let mut guard = self.state.lock().await;
                    guard.page = result;
                    guard.error = None;
                }
                debug!(page = current_page, "page loaded");
                let _ = self.events.send(SyncEvent::PageLoaded { current_page });
                Ok(())
            }
            Err(err) => {
                self.record_failure(Operation::FetchPosts, &err).await;
                Err(err)
            }
        }
    }

    async fn record_failure(&self, operation: Operation, err: &ClientError) {
        let info = err.to_error_info(operation);
        warn!(
            operation = %operation,
            status = ?info.status,
            error = %err,
            "operation failed"
        );
        self.state.lock().await.error = Some(info.clone());
        let _ = self.events.send(SyncEvent::ErrorRecorded(info));
    }
}

#[cfg(test)]
#[path = "tests/list_sync_tests.rs"]
mod tests;
