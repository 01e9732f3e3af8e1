use std::path::PathBuf;

use clap::Parser;
use url::Url;

pub mod op;
pub mod ops;

crate::command_enum! {
    /// Create the codepad directory and config
    (Init, ops::Init),
    /// Run the API server in the foreground
    (Daemon, ops::Daemon),
    /// Check local config and a running daemon
    (Health, ops::Health),
    /// Print the CLI version
    (Version, ops::Version),
    /// Work with project entries
    (Entry, ops::Entry),
}

#[derive(Parser, Debug)]
#[command(name = "codepad", version, about = "Path-keyed project store with browser terminals")]
pub struct Cli {
    /// Daemon API address
    #[arg(long, global = true, env = "CODEPAD_REMOTE", default_value = "http://localhost:5001")]
    pub remote: Url,

    /// Codepad directory (defaults to ~/.codepad)
    #[arg(long, global = true, env = "CODEPAD_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}
