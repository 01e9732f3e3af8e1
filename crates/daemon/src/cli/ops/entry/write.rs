use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{UpdateEntryBody, UpdateEntryRequest};
use common::Entry;

use super::read_content;

/// Replace the content of a file
#[derive(Args, Debug, Clone)]
pub struct Write {
    /// File path or id
    pub entry: String,

    #[arg(long, conflicts_with = "from_file", required_unless_present = "from_file")]
    pub content: Option<String>,

    /// Read the new content from a local file
    #[arg(long)]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct WriteOutput {
    pub entry: Entry,
}

impl fmt::Display for WriteOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.entry.content.as_deref().map(str::len).unwrap_or(0);
        write!(
            f,
            "{} {} ({} bytes)",
            "Saved".green().bold(),
            self.entry.path.to_string().bold(),
            bytes
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to read content: {0}")]
    Read(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Write {
    type Error = WriteError;
    type Output = WriteOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let content = read_content(self.content.as_deref(), self.from_file.as_deref())?;

        let mut client = ctx.client.clone();
        let response = client
            .call(UpdateEntryRequest {
                ident: self.entry.clone(),
                body: UpdateEntryBody {
                    path: None,
                    content,
                },
            })
            .await?;

        Ok(WriteOutput {
            entry: response.entry,
        })
    }
}
