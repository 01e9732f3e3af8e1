use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::api::v0::entries::{TreeRequest, TreeResponse};
use common::tree::FileTree;

#[derive(Args, Debug, Clone)]
pub struct Tree;

#[derive(Debug)]
pub struct TreeOutput {
    pub tree: FileTree,
}

impl fmt::Display for TreeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tree.is_empty() {
            return write!(f, "Project is empty");
        }

        let mut first = true;
        for (depth, node) in self.tree.walk() {
            if !first {
                writeln!(f)?;
            }
            first = false;

            let indent = "  ".repeat(depth);
            if node.kind.is_folder() {
                write!(f, "{indent}{}/", node.name.blue().bold())?;
            } else {
                write!(f, "{indent}{}", node.name)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Tree {
    type Error = TreeError;
    type Output = TreeOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: TreeResponse = client.call(TreeRequest {}).await?;
        Ok(TreeOutput {
            tree: response.tree,
        })
    }
}
