use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{DeleteEntryRequest, DeleteEntryResponse};
use common::EntryPath;

/// Delete an entry; folders are removed with their contents
#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Entry path or id
    pub entry: String,
}

#[derive(Debug)]
pub struct RmOutput {
    pub removed: Vec<EntryPath>,
}

impl fmt::Display for RmOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} entr{}",
            "Removed".red().bold(),
            self.removed.len(),
            if self.removed.len() == 1 { "y" } else { "ies" }
        )?;
        for path in &self.removed {
            write!(f, "\n  {}", path.to_string().dimmed())?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = RmOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: DeleteEntryResponse = client
            .call(DeleteEntryRequest {
                ident: self.entry.clone(),
            })
            .await?;

        Ok(RmOutput {
            removed: response.removed,
        })
    }
}
