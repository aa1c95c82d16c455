use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }
    };
}

id_newtype!(PostId);

/// A blog entry as returned by the server. The client only ever holds copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// Server-assigned creation timestamp, kept verbatim.
    pub date: String,
}

impl Post {
    /// Parses `date` for display. The reference server emits HTTP-dates
    /// (RFC 2822 style); RFC 3339 is accepted as well.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.date.trim();
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("content must not be empty")]
    EmptyContent,
}

/// Title and content of a post about to be created or replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Both fields must contain something other than whitespace. The values
    /// themselves are sent untrimmed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }
}

/// In-progress form content. `id == None` means the form creates a new post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    pub id: Option<PostId>,
    pub title: String,
    pub content: String,
}

impl EditDraft {
    pub fn for_create() -> Self {
        Self::default()
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            id: Some(post.id),
            title: post.title.clone(),
            content: post.content.clone(),
        }
    }

    pub fn to_post_draft(&self) -> PostDraft {
        PostDraft::new(self.title.clone(), self.content.clone())
    }
}

/// One page of posts plus pagination metadata.
///
/// `has_next`/`has_prev` always agree with `current_page` and `total_pages`,
/// and `items` never holds more than `per_page` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub items: Vec<Post>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageResult {
    /// Value held before the first fetch completes.
    pub fn empty(per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 0,
            total_items: 0,
            per_page: per_page.max(1),
            has_next: false,
            has_prev: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    pub fn find(&self, id: PostId) -> Option<&Post> {
        self.items.iter().find(|post| post.id == id)
    }

    /// Swaps the item carrying `post.id` for `post`. Returns false when the
    /// id is not on this page.
    pub fn replace_item(&mut self, post: Post) -> bool {
        match self.items.iter_mut().find(|item| item.id == post.id) {
            Some(slot) => {
                *slot = post;
                true
            }
            None => false,
        }
    }

    pub fn page_flags(current_page: u32, total_pages: u32) -> (bool, bool) {
        (current_page < total_pages, current_page > 1)
    }
}
