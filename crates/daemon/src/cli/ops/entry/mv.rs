use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{UpdateEntryBody, UpdateEntryRequest};

/// Rename a file, or move a folder with everything under it
#[derive(Args, Debug, Clone)]
pub struct Mv {
    /// Entry path or id
    pub from: String,
    /// New path
    pub to: String,
}

#[derive(Debug)]
pub struct MvOutput {
    pub from: String,
    pub to: String,
}

impl fmt::Display for MvOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            "Moved".green().bold(),
            self.from,
            self.to.bold()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MvError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mv {
    type Error = MvError;
    type Output = MvOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response = client
            .call(UpdateEntryRequest {
                ident: self.from.clone(),
                body: UpdateEntryBody {
                    path: Some(self.to.clone()),
                    content: None,
                },
            })
            .await?;

        Ok(MvOutput {
            from: self.from.clone(),
            to: response.entry.path.to_string(),
        })
    }
}
