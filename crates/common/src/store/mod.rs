use std::fmt::{Debug, Display};

use async_trait::async_trait;
use uuid::Uuid;

use crate::entry::{Entry, NewEntry};
use crate::path::EntryPath;

pub mod memory;

pub use memory::{MemoryPathStore, MemoryPathStoreError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathStoreError<T> {
    /// Backend specific failure
    #[error("unhandled path store provider error: {0}")]
    Provider(#[from] T),
    #[error("entry not found: {0}")]
    NotFound(EntryPath),
    /// The target path is already occupied
    #[error("path already exists: {0}")]
    Conflict(EntryPath),
    /// A rewritten descendant would collide with an existing entry.
    /// Nothing was changed.
    #[error("moving {root} would overwrite {path}")]
    CascadeConflict { root: EntryPath, path: EntryPath },
    /// An ancestor slot is held by a file, so no folder can be placed there
    #[error("ancestor is a file: {0}")]
    AncestorIsFile(EntryPath),
}

/// Persistence contract for path-keyed entries.
///
/// Every mutating call is a single all-or-nothing batch: either every row it
/// touches is written, or none are.
#[async_trait]
pub trait PathStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    async fn get(&self, path: &EntryPath) -> Result<Option<Entry>, PathStoreError<Self::Error>>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entry>, PathStoreError<Self::Error>>;

    /// Every entry, in no particular order
    async fn list(&self) -> Result<Vec<Entry>, PathStoreError<Self::Error>>;

    /// Insert `entry`, first upserting each of `ancestors` as a folder.
    ///
    /// Ancestor upserts are idempotent: an existing folder is left alone, an
    /// existing file yields `AncestorIsFile`. Fails with `Conflict` when
    /// `entry.path` is taken.
    async fn insert_or_fail(
        &self,
        entry: NewEntry,
        ancestors: &[EntryPath],
    ) -> Result<Entry, PathStoreError<Self::Error>>;

    /// Move the entry at `old` to `new`, along with every descendant.
    ///
    /// Descendants keep their suffix below `old` byte for byte. `ancestors`
    /// are upserted as folders for `new`. Returns the rewritten entries with
    /// the moved root first.
    ///
    /// * `NotFound` - nothing at `old`
    /// * `Conflict` - `new` itself is occupied
    /// * `CascadeConflict` - some rewritten descendant collides
    async fn update_path(
        &self,
        old: &EntryPath,
        new: &EntryPath,
        ancestors: &[EntryPath],
    ) -> Result<Vec<Entry>, PathStoreError<Self::Error>>;

    /// Replace a file's content and bump `updated_at`
    async fn update_content(
        &self,
        path: &EntryPath,
        content: &str,
    ) -> Result<Entry, PathStoreError<Self::Error>>;

    /// Remove exactly one entry. Returns whether anything was removed.
    async fn delete_one(&self, path: &EntryPath) -> Result<bool, PathStoreError<Self::Error>>;

    /// Remove `prefix` and all of its descendants.
    ///
    /// Returns the removed paths.
    async fn delete_by_prefix(
        &self,
        prefix: &EntryPath,
    ) -> Result<Vec<EntryPath>, PathStoreError<Self::Error>>;

    /// Whether anything lives at `path`
    async fn exists(&self, path: &EntryPath) -> Result<bool, PathStoreError<Self::Error>> {
        Ok(self.get(path).await?.is_some())
    }
}
