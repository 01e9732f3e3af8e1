use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::path::EntryPath;

/// Whether an entry holds content or only groups other entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, EntryKind::Folder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entry kind: {0}")]
pub struct UnknownEntryKind(pub String);

impl FromStr for EntryKind {
    type Err = UnknownEntryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(EntryKind::File),
            "folder" => Ok(EntryKind::Folder),
            other => Err(UnknownEntryKind(other.to_string())),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file or folder in a project.
///
/// `id` is stable across renames; `path` is the unique structural key.
/// Folders never carry `content` or `language`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub path: EntryPath,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Entry {
    /// An empty folder created implicitly to hold a deeper entry
    pub fn implicit_folder(path: EntryPath, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            kind: EntryKind::Folder,
            content: None,
            language: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            path: self.path.clone(),
            kind: self.kind,
            language: self.language.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// An entry without its content, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: Uuid,
    pub path: EntryPath,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Entry> for EntrySummary {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            path: entry.path,
            kind: entry.kind,
            language: entry.language,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// An entry about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub path: EntryPath,
    pub kind: EntryKind,
    pub content: Option<String>,
    pub language: Option<String>,
}

impl NewEntry {
    pub fn file(path: EntryPath, content: impl Into<String>, language: Option<String>) -> Self {
        Self {
            path,
            kind: EntryKind::File,
            content: Some(content.into()),
            language,
        }
    }

    pub fn folder(path: EntryPath) -> Self {
        Self {
            path,
            kind: EntryKind::Folder,
            content: None,
            language: None,
        }
    }

    /// Assign an identity and timestamps
    pub fn into_entry(self, now: OffsetDateTime) -> Entry {
        let (content, language) = match self.kind {
            EntryKind::File => (Some(self.content.unwrap_or_default()), self.language),
            EntryKind::Folder => (None, None),
        };
        Entry {
            id: Uuid::new_v4(),
            path: self.path,
            kind: self.kind,
            content,
            language,
            created_at: now,
            updated_at: now,
        }
    }
}
