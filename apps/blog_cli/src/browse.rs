//! Interactive list/detail loop over the controllers.

use anyhow::Result;
use client_core::{
    ClientError, DeleteOutcome, DetailViewController, EditSession, ListSyncController,
};
use shared::domain::PostId;
use tokio::io::AsyncBufRead;

use crate::{
    prompt::{self, Prompter},
    render,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Goto(u32),
    Reload,
    Show(PostId),
    New,
    Edit(PostId),
    Delete(PostId),
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  n | next          next page
  p | prev          previous page
  g N | page N      go to page N
  r | reload        reload current page
  show ID           open a post
  new               write a new post
  edit ID           edit a post on this page
  delete ID         delete a post
  h | help          this text
  q | quit          leave";

impl BrowseCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments: {line}"));
        }

        let post_id = |arg: Option<&str>| -> Result<PostId, String> {
            let raw = arg.ok_or_else(|| format!("`{verb}` needs a post id"))?;
            raw.parse::<PostId>()
                .map_err(|_| format!("not a post id: {raw}"))
        };

        let command = match verb.as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Prev,
            "g" | "page" => {
                let raw = arg.ok_or_else(|| "`page` needs a page number".to_string())?;
                let page = raw
                    .parse::<u32>()
                    .map_err(|_| format!("not a page number: {raw}"))?;
                return Ok(Self::Goto(page));
            }
            "r" | "reload" => Self::Reload,
            "show" => return post_id(arg).map(Self::Show),
            "new" => Self::New,
            "edit" => return post_id(arg).map(Self::Edit),
            "delete" | "rm" => return post_id(arg).map(Self::Delete),
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            "" => return Err("empty command".into()),
            other => return Err(format!("unknown command: {other}")),
        };
        if arg.is_some() {
            return Err(format!("`{verb}` takes no arguments"));
        }
        Ok(command)
    }
}

pub struct Browser<'a, R> {
    list: &'a ListSyncController,
    detail: &'a DetailViewController,
    prompter: &'a Prompter<R>,
    session: EditSession,
}

impl<'a, R> Browser<'a, R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(
        list: &'a ListSyncController,
        detail: &'a DetailViewController,
        prompter: &'a Prompter<R>,
    ) -> Self {
        Self {
            list,
            detail,
            prompter,
            session: EditSession::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let _ = self.list.refresh(1).await;
        self.show_list().await;

        while let Some(line) = self.prompter.ask("blog> ").await? {
            let command = match BrowseCommand::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{message} (try `help`)");
                    continue;
                }
            };
            if !self.dispatch(command).await? {
                break;
            }
        }
        Ok(())
    }

    /// Runs one command. `false` ends the session.
    async fn dispatch(&mut self, command: BrowseCommand) -> Result<bool> {
        if self.list.is_loading() && command != BrowseCommand::Quit {
            println!("still loading; try again in a moment");
            return Ok(true);
        }

        let outcome = match command {
            BrowseCommand::Next => self.list.next_page().await.map(|_| ()),
            BrowseCommand::Prev => self.list.prev_page().await.map(|_| ()),
            BrowseCommand::Goto(page) => match self.list.change_page(page).await {
                Ok(false) => {
                    println!("no page {page}");
                    Ok(())
                }
                other => other.map(|_| ()),
            },
            BrowseCommand::Reload => self.list.refresh_current().await,
            BrowseCommand::Show(id) => {
                self.detail.load(id).await;
                print!("{}", render::detail(&self.detail.snapshot().await));
                self.detail.unmount().await;
                return Ok(true);
            }
            BrowseCommand::New => {
                self.session.open_for_create();
                self.fill_and_submit().await?
            }
            BrowseCommand::Edit(id) => {
                let cached = self.list.snapshot().await.page.find(id).cloned();
                let Some(post) = cached else {
                    println!("post {id} is not on this page");
                    return Ok(true);
                };
                self.session.open_for_edit(&post);
                self.fill_and_submit().await?
            }
            BrowseCommand::Delete(id) => match self.list.delete(id, self.prompter).await {
                Ok(DeleteOutcome::Cancelled) => {
                    println!("kept post {id}");
                    Ok(())
                }
                other => other.map(|_| ()),
            },
            BrowseCommand::Help => {
                println!("{HELP}");
                return Ok(true);
            }
            BrowseCommand::Quit => return Ok(false),
        };

        if let Err(ClientError::Busy) = outcome {
            println!("still loading; try again in a moment");
        }
        self.show_list().await;
        Ok(true)
    }

    /// Reads title and content into the open draft; blank input keeps the
    /// current value. Validation failures leave the form open for another try.
    async fn fill_and_submit(&mut self) -> Result<Result<(), ClientError>> {
        loop {
            let Some(draft) = self.session.draft().cloned() else {
                return Ok(Ok(()));
            };

            let Some(title) = self.prompter.ask(&format!("title [{}]: ", draft.title)).await?
            else {
                self.session.cancel();
                return Ok(Ok(()));
            };
            if !title.trim().is_empty() {
                self.session.set_title(title);
            }

            let Some(content) = self.prompter.ask("content: ").await? else {
                self.session.cancel();
                return Ok(Ok(()));
            };
            if !content.trim().is_empty() {
                self.session.set_content(content);
            }

            match self.session.submit(self.list).await {
                Err(ClientError::Validation(err)) => {
                    let retry = self.prompter.ask(&format!("{err}; try again? [y/N] ")).await?;
                    if !retry.as_deref().is_some_and(prompt::is_yes) {
                        self.session.cancel();
                        return Ok(Ok(()));
                    }
                }
                other => return Ok(other.map(|_| ())),
            }
        }
    }

    async fn show_list(&self) {
        print!("{}", render::page(&self.list.snapshot().await));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use client_core::BlogApi;
    use shared::domain::{PageResult, Post};

    use super::*;

    /// Empty collection that counts page loads.
    #[derive(Default)]
    struct EmptyBlog {
        lists: AtomicUsize,
    }

    #[async_trait]
    impl BlogApi for EmptyBlog {
        async fn list(&self, _page: u32, per_page: u32) -> Result<PageResult, ClientError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(PageResult::empty(per_page))
        }

        async fn get(&self, id: PostId) -> Result<Post, ClientError> {
            Err(ClientError::NotFound(id))
        }

        async fn create(&self, _title: &str, _content: &str) -> Result<Post, ClientError> {
            Err(ClientError::Busy)
        }

        async fn update(
            &self,
            id: PostId,
            _title: &str,
            _content: &str,
        ) -> Result<Post, ClientError> {
            Err(ClientError::NotFound(id))
        }

        async fn delete(&self, id: PostId) -> Result<(), ClientError> {
            Err(ClientError::NotFound(id))
        }
    }

    async fn browse(input: &'static [u8]) -> usize {
        let api = Arc::new(EmptyBlog::default());
        let list = ListSyncController::new(api.clone(), 6);
        let detail = DetailViewController::new(api.clone());
        let prompter = Prompter::new(input);

        Browser::new(&list, &detail, &prompter)
            .run()
            .await
            .expect("browse");
        api.lists.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn quit_ends_session_before_later_commands() {
        assert_eq!(browse(b"q\nr\n").await, 1);
    }

    #[tokio::test]
    async fn commands_run_until_end_of_input() {
        assert_eq!(browse(b"r\nbogus\nr\n").await, 3);
    }

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(BrowseCommand::parse("n"), Ok(BrowseCommand::Next));
        assert_eq!(BrowseCommand::parse(" PREV "), Ok(BrowseCommand::Prev));
        assert_eq!(BrowseCommand::parse("g 3"), Ok(BrowseCommand::Goto(3)));
        assert_eq!(BrowseCommand::parse("page 0"), Ok(BrowseCommand::Goto(0)));
        assert_eq!(BrowseCommand::parse("q"), Ok(BrowseCommand::Quit));
    }

    #[test]
    fn parses_post_commands() {
        assert_eq!(
            BrowseCommand::parse("show 12"),
            Ok(BrowseCommand::Show(PostId(12)))
        );
        assert_eq!(
            BrowseCommand::parse("edit 4"),
            Ok(BrowseCommand::Edit(PostId(4)))
        );
        assert_eq!(
            BrowseCommand::parse("rm 4"),
            Ok(BrowseCommand::Delete(PostId(4)))
        );
        assert_eq!(BrowseCommand::parse("new"), Ok(BrowseCommand::New));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(BrowseCommand::parse("").is_err());
        assert!(BrowseCommand::parse("show").is_err());
        assert!(BrowseCommand::parse("show abc").is_err());
        assert!(BrowseCommand::parse("g x").is_err());
        assert!(BrowseCommand::parse("next 2").is_err());
        assert!(BrowseCommand::parse("delete 1 2").is_err());
        assert!(BrowseCommand::parse("publish").is_err());
    }
}
