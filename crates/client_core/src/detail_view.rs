use std::sync::Arc;

use shared::{
    domain::{Post, PostId},
    error::ErrorInfo,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    error::{ClientError, Operation},
    BlogApi,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailState {
    #[default]
    Idle,
    Loading(PostId),
    Found(Post),
    NotFound(PostId),
    Failed(ErrorInfo),
}

struct DetailInner {
    state: DetailState,
    generation: u64,
}

/// Single-post view. Always fetches; never reuses list data.
pub struct DetailViewController {
    api: Arc<dyn BlogApi>,
    inner: Mutex<DetailInner>,
}

impl DetailViewController {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(DetailInner {
                state: DetailState::Idle,
                generation: 0,
            }),
        }
    }

    pub async fn snapshot(&self) -> DetailState {
        self.inner.lock().await.state.clone()
    }

    /// Returns `None` when the view was unmounted or another load started
    /// before this fetch resolved; the late result is dropped.
    pub async fn load(&self, id: PostId) -> Option<DetailState> {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            guard.state = DetailState::Loading(id);
            guard.generation
        };

        let next = match self.api.get(id).await {
            Ok(post) => DetailState::Found(post),
            Err(ClientError::NotFound(_)) => DetailState::NotFound(id),
            Err(err) => {
                warn!(post_id = %id, error = %err, "failed to load post");
                DetailState::Failed(err.to_error_info(Operation::LoadPost))
            }
        };

        let mut guard = self.inner.lock().await;
        if guard.generation != ticket {
            debug!(post_id = %id, "discarding stale post load");
            return None;
        }
        guard.state = next.clone();
        Some(next)
    }

    /// The consuming view went away; any fetch still pending is ignored.
    pub async fn unmount(&self) {
        let mut guard = self.inner.lock().await;
        guard.generation += 1;
        guard.state = DetailState::Idle;
    }
}

#[cfg(test)]
#[path = "tests/detail_view_tests.rs"]
mod tests;
