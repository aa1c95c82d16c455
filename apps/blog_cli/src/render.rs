//! Text rendering of controller state. Pure functions over snapshots.

use std::fmt::Write as _;

use client_core::{DetailState, SyncState};
use shared::domain::Post;

const PREVIEW_CHARS: usize = 72;

pub fn display_date(post: &Post) -> String {
    post.published_at()
        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| post.date.clone())
}

fn preview(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}

pub fn page(state: &SyncState) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "error: {}", error.message);
    }
    if state.loading {
        let _ = writeln!(out, "loading...");
        return out;
    }

    let page = &state.page;
    if page.items.is_empty() {
        let _ = writeln!(out, "No posts yet. Use `new` to create the first one.");
        return out;
    }

    for post in &page.items {
        let _ = writeln!(out, "#{:<5} {}  ({})", post.id.0, post.title, display_date(post));
        let _ = writeln!(out, "       {}", preview(&post.content));
    }

    let prev = if page.has_prev { "[p]rev" } else { "" };
    let next = if page.has_next { "[n]ext" } else { "" };
    let _ = writeln!(
        out,
        "-- page {}/{} ({} posts) {prev} {next}",
        page.current_page, page.total_pages, page.total_items
    );
    out
}

pub fn detail(state: &DetailState) -> String {
    match state {
        DetailState::Idle => String::new(),
        DetailState::Loading(id) => format!("loading post {id}...\n"),
        DetailState::Found(post) => format!(
            "#{} {}\n{}\n\n{}\n",
            post.id,
            post.title,
            display_date(post),
            post.content
        ),
        DetailState::NotFound(id) => format!("post {id} not found\n"),
        DetailState::Failed(error) => format!("error: {}\n", error.message),
    }
}
