use shared::domain::{EditDraft, Post, PostDraft, PostId, ValidationError};
use tracing::debug;

use crate::{error::ClientError, list_sync::ListSyncController};

/// Create/edit form state. Independent of the network until `submit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Closed,
    CreatingDraft(EditDraft),
    /// `id` is the post the draft will replace.
    EditingDraft { id: PostId, draft: EditDraft },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(PostDraft),
    Update(PostId, PostDraft),
}

impl EditSession {
    pub fn open_for_create(&mut self) {
        *self = Self::CreatingDraft(EditDraft::for_create());
    }

    pub fn open_for_edit(&mut self, post: &Post) {
        *self = Self::EditingDraft {
            id: post.id,
            draft: EditDraft::from_post(post),
        };
    }

    pub fn cancel(&mut self) {
        *self = Self::Closed;
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match self {
            Self::Closed => None,
            Self::CreatingDraft(draft) | Self::EditingDraft { draft, .. } => Some(draft),
        }
    }

    pub fn editing_target(&self) -> Option<PostId> {
        match self {
            Self::EditingDraft { id, .. } => Some(*id),
            _ => None,
        }
    }

    fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match self {
            Self::Closed => None,
            Self::CreatingDraft(draft) | Self::EditingDraft { draft, .. } => Some(draft),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.title = title.into();
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.content = content.into();
        }
    }

    /// `None` while closed.
    pub fn submission(&self) -> Option<Result<Submission, ValidationError>> {
        let post_draft = self.draft()?.to_post_draft();
        if let Err(err) = post_draft.validate() {
            return Some(Err(err));
        }
        Some(Ok(match self.editing_target() {
            Some(id) => Submission::Update(id, post_draft),
            None => Submission::Create(post_draft),
        }))
    }

    /// Validates and hands the draft to `controller`.
    ///
    /// The form stays open on validation failure or when the controller is
    /// busy, since nothing was dispatched. Once a mutation has been dispatched
    /// the form closes whatever the network outcome; a failure is visible in
    /// the controller's state.
    pub async fn submit(
        &mut self,
        controller: &ListSyncController,
    ) -> Result<Option<Post>, ClientError> {
        let submission = match self.submission() {
            None => return Ok(None),
            Some(submission) => submission?,
        };

        let result = match &submission {
            Submission::Create(draft) => controller.create(draft).await,
            Submission::Update(id, draft) => controller.update(*id, draft).await,
        };

        if matches!(result, Err(ClientError::Busy)) {
            debug!("submit refused while another operation is in flight");
            return Err(ClientError::Busy);
        }
        self.cancel();
        result.map(Some)
    }
}

#[cfg(test)]
#[path = "tests/edit_session_tests.rs"]
mod tests;
