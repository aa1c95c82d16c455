use std::{path::PathBuf, sync::Arc};

mod browse;
mod prompt;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AlwaysConfirm, BlogApi, ClientSettings, Confirmation, DeleteOutcome,
    DetailState, DetailViewController, EditSession, HttpBlogClient, ListSyncController,
};
use shared::domain::PostId;
use tracing_subscriber::EnvFilter;

use crate::{browse::Browser, prompt::Prompter};

#[derive(Parser, Debug)]
#[command(name = "blog", about = "Browse and edit posts on a blog API")]
struct Cli {
    /// Settings file; defaults to ./blog.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    per_page: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of posts.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Print a single post.
    Show { id: PostId },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Replace title and/or content of a post.
    Edit {
        id: PostId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete {
        id: PostId,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Interactive list/detail session.
    Browse,
}

fn settings_from(cli: &Cli) -> ClientSettings {
    let mut settings = load_settings(cli.config.as_deref());
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(per_page) = cli.per_page {
        settings.set_per_page(per_page);
    }
    settings
}

/// Prints the current page. A recorded error fails only when `strict`; after
/// a completed mutation a failed reload is shown but is not fatal.
async fn print_page(list: &ListSyncController, strict: bool) -> Result<()> {
    let state = list.snapshot().await;
    print!("{}", render::page(&state));
    match state.error {
        Some(error) if strict => bail!(error.message),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = settings_from(&cli);

    let api: Arc<dyn BlogApi> = Arc::new(
        HttpBlogClient::new(&settings)
            .with_context(|| format!("failed to configure api client for {}", settings.api_base_url))?,
    );
    let list = ListSyncController::new(api.clone(), settings.per_page);
    let detail = DetailViewController::new(api);

    match cli.command {
        Command::List { page } => {
            let _ = list.refresh(page).await;
            print_page(&list, true).await?;
        }
        Command::Show { id } => {
            let state = detail.load(id).await.unwrap_or_default();
            print!("{}", render::detail(&state));
            match state {
                DetailState::NotFound(id) => bail!("post {id} not found"),
                DetailState::Failed(error) => bail!(error.message),
                _ => {}
            }
        }
        Command::Create { title, content } => {
            let mut session = EditSession::default();
            session.open_for_create();
            session.set_title(title);
            session.set_content(content);
            let created = session.submit(&list).await?;
            if let Some(post) = created {
                println!("created post {}", post.id);
            }
            print_page(&list, false).await?;
        }
        Command::Edit { id, title, content } => {
            let post = match detail.load(id).await {
                Some(DetailState::Found(post)) => post,
                Some(DetailState::NotFound(_)) => bail!("post {id} not found"),
                Some(DetailState::Failed(error)) => bail!(error.message),
                _ => bail!("post {id} could not be loaded"),
            };
            let mut session = EditSession::default();
            session.open_for_edit(&post);
            if let Some(title) = title {
                session.set_title(title);
            }
            if let Some(content) = content {
                session.set_content(content);
            }
            if let Some(updated) = session.submit(&list).await? {
                print!("{}", render::detail(&DetailState::Found(updated)));
            }
        }
        Command::Delete { id, yes } => {
            let prompter = Prompter::stdin();
            let confirmation: &dyn Confirmation = if yes { &AlwaysConfirm } else { &prompter };
            match list.delete(id, confirmation).await? {
                DeleteOutcome::Cancelled => println!("kept post {id}"),
                DeleteOutcome::Deleted => {
                    println!("deleted post {id}");
                    print_page(&list, false).await?;
                }
            }
        }
        Command::Browse => {
            let prompter = Prompter::stdin();
            Browser::new(&list, &detail, &prompter).run().await?;
        }
    }

    Ok(())
}
