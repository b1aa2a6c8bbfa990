#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for querying a mailbox through the retrieval core (read-only)

use clap::{Parser, Subcommand};
use mailapi::response::{EmailResponse, FolderResponse, InboxResponse, PageResponse};
use mailapi::{Error, ImapConfig, MailSession, PaginationParams, create_response};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailapi-cli")]
#[command(about = "Read-only CLI for an IMAP mailbox, printing API JSON")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available folders
    Folders,

    /// Folders plus one page of the inbox
    Inbox {
        #[command(flatten)]
        page: PageArgs,
    },

    /// One page of a folder, newest first
    Folder {
        /// Folder name as the server reports it
        #[arg(long)]
        name: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show a single message by sequence number
    Show {
        /// Message sequence number
        id: String,

        /// Folder containing the message (default: INBOX)
        #[arg(long, default_value = "")]
        folder: String,
    },
}

#[derive(clap::Args)]
struct PageArgs {
    /// Page number, 1 is the newest
    #[arg(long)]
    page: Option<String>,

    /// Messages per page
    #[arg(long)]
    page_size: Option<String>,
}

impl PageArgs {
    fn params(&self) -> PaginationParams {
        PaginationParams::from_query(self.page.as_deref(), self.page_size.as_deref())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let status = e.downcast_ref::<Error>().map_or(500, Error::status_code);
            let body = ErrorResponse {
                error: e.to_string(),
                status,
            };
            match serde_json::to_string(&body) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{e}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<String> {
    let config = ImapConfig::from_env()?;
    let mut session = MailSession::open(config).await?;

    let result = dispatch(&session, &args.command).await;
    session.disconnect().await.ok();
    result
}

async fn dispatch(session: &MailSession, command: &Command) -> anyhow::Result<String> {
    match command {
        Command::Folders => cmd_folders(session).await,
        Command::Inbox { page } => cmd_inbox(session, page.params()).await,
        Command::Folder { name, page } => cmd_folder(session, name, page.params()).await,
        Command::Show { id, folder } => cmd_show(session, id, folder).await,
    }
}

async fn cmd_folders(session: &MailSession) -> anyhow::Result<String> {
    let folders: Vec<FolderResponse> = session
        .list_folders()
        .await?
        .iter()
        .map(FolderResponse::from)
        .collect();

    Ok(serde_json::to_string_pretty(&folders)?)
}

async fn cmd_inbox(session: &MailSession, params: PaginationParams) -> anyhow::Result<String> {
    let folders = session.list_folders().await?;
    let page = session.fetch_inbox(params).await?;

    let response = InboxResponse {
        folders: folders.iter().map(FolderResponse::from).collect(),
        inbox: page.messages.iter().map(EmailResponse::summary).collect(),
        pagination: create_response(params, u64::from(page.total)),
    };
    Ok(serde_json::to_string_pretty(&response)?)
}

async fn cmd_folder(
    session: &MailSession,
    name: &str,
    params: PaginationParams,
) -> anyhow::Result<String> {
    let page = session.fetch_folder(name, params).await?;

    let response = PageResponse {
        data: page.messages.iter().map(EmailResponse::summary).collect(),
        pagination: create_response(params, u64::from(page.total)),
    };
    Ok(serde_json::to_string_pretty(&response)?)
}

async fn cmd_show(session: &MailSession, id: &str, folder: &str) -> anyhow::Result<String> {
    let message = session.fetch_message(id, folder).await?;
    Ok(serde_json::to_string_pretty(&EmailResponse::detail(&message))?)
}
