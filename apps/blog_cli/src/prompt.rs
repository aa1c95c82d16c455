//! Line-oriented terminal input, including the delete confirmation.

use std::io::Write as _;

use async_trait::async_trait;
use client_core::Confirmation;
use shared::domain::{Post, PostId};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};

pub struct Prompter<R> {
    lines: Mutex<Lines<R>>,
}

impl Prompter<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> Prompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Prints `question` and reads one line. `None` at end of input.
    pub async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        print!("{question}");
        std::io::stdout().flush()?;
        let mut lines = self.lines.lock().await;
        Ok(lines.next_line().await?.map(|line| line.trim_end().to_string()))
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl<R> Confirmation for Prompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm_delete(&self, id: PostId, post: Option<&Post>) -> bool {
        let question = match post {
            Some(post) => format!("Delete post {id} \"{}\"? [y/N] ", post.title),
            None => format!("Delete post {id}? [y/N] "),
        };
        match self.ask(&question).await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read confirmation");
                false
            }
        }
    }
}
