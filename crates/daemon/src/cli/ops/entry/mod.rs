use clap::{Args, Subcommand};

pub mod cat;
pub mod create;
pub mod ls;
pub mod mv;
pub mod rm;
pub mod sync;
pub mod tree;
pub mod write;

use crate::cli::op::Op;

crate::command_enum! {
    (Ls, ls::Ls),
    (Tree, tree::Tree),
    (Cat, cat::Cat),
    (Create, create::Create),
    (Write, write::Write),
    (Mv, mv::Mv),
    (Rm, rm::Rm),
    (Sync, sync::SyncEntry),
}

pub type EntryCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Entry {
    #[command(subcommand)]
    pub command: EntryCommand,
}

#[async_trait::async_trait]
impl Op for Entry {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Read content from `--content`, or from a local file when given instead
pub(crate) fn read_content(
    inline: Option<&str>,
    from_file: Option<&std::path::Path>,
) -> std::io::Result<Option<String>> {
    match (inline, from_file) {
        (Some(text), _) => Ok(Some(text.to_string())),
        (None, Some(path)) => std::fs::read_to_string(path).map(Some),
        (None, None) => Ok(None),
    }
}
