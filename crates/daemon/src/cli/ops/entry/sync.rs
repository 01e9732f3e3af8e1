use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{SyncEntryRequest, SyncEntryResponse};

/// Write a file's stored content into the daemon's workspace
#[derive(Args, Debug, Clone)]
pub struct SyncEntry {
    /// Entry path or id
    pub entry: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug)]
pub struct SyncOutput {
    pub response: SyncEntryResponse,
}

impl fmt::Display for SyncOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.response.written {
            Some(written) => write!(
                f,
                "{} {} -> {}",
                "Synced".green().bold(),
                self.response.entry.path,
                written
            ),
            None => write!(
                f,
                "{} {} (folder, nothing written)",
                "Synced".green().bold(),
                self.response.entry.path
            ),
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SyncEntry {
    type Error = SyncError;
    type Output = SyncOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response = client
            .call(SyncEntryRequest {
                ident: self.entry.clone(),
            })
            .await?;
        Ok(SyncOutput { response })
    }
}
