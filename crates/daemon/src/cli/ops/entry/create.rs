use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{CreateEntryRequest, CreateEntryResponse};
use common::{Entry, EntryKind};

use super::read_content;

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Path of the new entry, e.g. `src/main.rs`
    pub path: String,

    /// Create a folder instead of a file
    #[arg(long, conflicts_with_all = ["content", "from_file", "language"])]
    pub folder: bool,

    /// Initial file content
    #[arg(long, conflicts_with = "from_file")]
    pub content: Option<String>,

    /// Read initial content from a local file
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    /// Language id; derived from the extension when omitted
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Debug)]
pub struct CreateOutput {
    pub entry: Entry,
}

impl fmt::Display for CreateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {}",
            "Created".green().bold(),
            self.entry.kind,
            self.entry.path.to_string().bold()
        )?;
        if let Some(language) = &self.entry.language {
            writeln!(f, "  {} {}", "language:".dimmed(), language)?;
        }
        write!(f, "  {} {}", "id:".dimmed(), self.entry.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to read content: {0}")]
    Read(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = CreateError;
    type Output = CreateOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let kind = if self.folder {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        let content = read_content(self.content.as_deref(), self.from_file.as_deref())?;

        let mut client = ctx.client.clone();
        let request = CreateEntryRequest {
            path: Some(self.path.clone()),
            kind: Some(kind.to_string()),
            content,
            language: self.language.clone(),
        };
        let response: CreateEntryResponse = client.call(request).await?;

        Ok(CreateOutput {
            entry: response.entry,
        })
    }
}
