use std::fmt;

use clap::Args;
use comfy_table::Table;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{ListEntriesRequest, ListEntriesResponse};
use common::EntrySummary;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Only show entries under this folder
    #[arg(long)]
    pub under: Option<String>,
}

#[derive(Debug)]
pub struct LsOutput {
    pub items: Vec<EntrySummary>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "No entries found");
        }

        let mut table = Table::new();
        table.set_header(vec!["TYPE", "PATH", "LANGUAGE", "ID"]);
        for item in &self.items {
            table.add_row(vec![
                item.kind.to_string(),
                item.path.to_string(),
                item.language.clone().unwrap_or_default(),
                item.id.to_string(),
            ]);
        }
        write!(f, "{table}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("invalid folder path: {0}")]
    InvalidPath(#[from] common::PathError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let under = self
            .under
            .as_deref()
            .map(common::EntryPath::parse)
            .transpose()?;

        let mut client = ctx.client.clone();
        let response: ListEntriesResponse = client.call(ListEntriesRequest {}).await?;

        let items = response
            .entries
            .into_iter()
            .filter(|entry| match &under {
                Some(folder) => entry.path.is_descendant_of(folder),
                None => true,
            })
            .collect();
        Ok(LsOutput { items })
    }
}
