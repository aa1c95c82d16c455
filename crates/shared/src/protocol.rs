use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{PageResult, Post, PostDraft};

/// Query string of `GET /api/blogs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
}

/// Body of `GET /api/blogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogListResponse {
    pub blogs: Vec<Post>,
    pub current_page: u32,
    pub pages: u32,
    pub total: u64,
    pub per_page: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// Body of `POST /api/blogs` and `PUT /api/blogs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWriteRequest {
    pub title: String,
    pub content: String,
}

impl From<&PostDraft> for PostWriteRequest {
    fn from(value: &PostDraft) -> Self {
        Self {
            title: value.title.clone(),
            content: value.content.clone(),
        }
    }
}

impl From<BlogListResponse> for PageResult {
    fn from(value: BlogListResponse) -> Self {
        let current_page = value.current_page.max(1);
        let per_page = value.per_page.max(1);
        let (has_next, has_prev) = PageResult::page_flags(current_page, value.pages);
        if has_next != value.has_next || has_prev != value.has_prev {
            warn!(
                current_page,
                pages = value.pages,
                server_has_next = value.has_next,
                server_has_prev = value.has_prev,
                "server pagination flags disagree with page counts; using computed flags"
            );
        }

        let mut items = value.blogs;
        if items.len() > per_page as usize {
            warn!(
                received = items.len(),
                per_page, "server returned more posts than per_page; truncating"
            );
            items.truncate(per_page as usize);
        }

        PageResult {
            items,
            current_page,
            total_pages: value.pages,
            total_items: value.total,
            per_page,
            has_next,
            has_prev,
        }
    }
}
