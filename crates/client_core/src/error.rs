use std::fmt;

use shared::{
    domain::{PostId, ValidationError},
    error::{ErrorCode, ErrorInfo},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    Network {
        status: Option<u16>,
        message: String,
    },
    #[error("post {0} not found")]
    NotFound(PostId),
    #[error("another operation is already in progress")]
    Busy,
}

impl ClientError {
    pub fn http_status(status: reqwest::StatusCode) -> Self {
        let message = match status.canonical_reason() {
            Some(reason) => format!("server returned HTTP {} {reason}", status.as_u16()),
            None => format!("server returned HTTP {}", status.as_u16()),
        };
        Self::Network {
            status: Some(status.as_u16()),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::Network { .. } => ErrorCode::Network,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Busy => ErrorCode::Busy,
        }
    }

    /// Converts the failure into the message stored in view state.
    pub fn to_error_info(&self, operation: Operation) -> ErrorInfo {
        ErrorInfo::new(self.code(), format!("failed to {operation}: {self}"))
            .with_status(self.status())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network {
            status: value.status().map(|status| status.as_u16()),
            message: value.to_string(),
        }
    }
}

/// What the controller was doing when a failure was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchPosts,
    CreatePost,
    UpdatePost,
    DeletePost,
    LoadPost,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FetchPosts => "fetch posts",
            Self::CreatePost => "create post",
            Self::UpdatePost => "update post",
            Self::DeletePost => "delete post",
            Self::LoadPost => "load post",
        };
        f.write_str(text)
    }
}
