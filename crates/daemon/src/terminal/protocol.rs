//! JSON frames exchanged over the terminal WebSocket.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COLS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Start the shell. Only the first `init` on a connection counts.
    Init {
        #[serde(default, rename = "fileRef", alias = "fileId")]
        file_ref: Option<String>,
        #[serde(default)]
        cols: Option<u16>,
        #[serde(default)]
        rows: Option<u16>,
    },
    /// Raw input for the shell
    Command { data: String },
    Resize { cols: u16, rows: u16 },
    /// Kill the shell but keep the socket open
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Shell output
    Data { data: String },
    Error { data: String },
}

impl ServerMessage {
    pub fn exited(code: u32) -> Self {
        ServerMessage::Error {
            data: format!("\r\n[Terminal exited with code {code}]"),
        }
    }

    pub fn spawn_failed(reason: &str) -> Self {
        ServerMessage::Error {
            data: format!("\r\n\x1b[31mError: Could not start terminal. {reason}\x1b[0m\r\n"),
        }
    }
}

/// Terminal dimensions with zero or missing values replaced by defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub cols: u16,
    pub rows: u16,
}

impl Dimensions {
    pub fn new(cols: Option<u16>, rows: Option<u16>) -> Self {
        Self {
            cols: cols.filter(|c| *c > 0).unwrap_or(DEFAULT_COLS),
            rows: rows.filter(|r| *r > 0).unwrap_or(DEFAULT_ROWS),
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(None, None)
    }
}
