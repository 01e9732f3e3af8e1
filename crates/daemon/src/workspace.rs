//! On-disk mirror of project files.
//!
//! The mirror is write-only from the daemon's point of view: the store is the
//! source of truth and nothing here is ever read back into it. Only explicit
//! writes report failure; cleanup after deletes and renames is best effort.

use std::io;
use std::path::{Path, PathBuf};

use common::EntryPath;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace root {0}: {1}")]
    CreateRoot(PathBuf, io::Error),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, io::Error),
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use `root` as the mirror directory, creating it if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| WorkspaceError::CreateRoot(root.clone(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `path` lives on disk
    pub fn resolve(&self, path: &EntryPath) -> PathBuf {
        path.segments()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// The directory holding `path`; the root for top-level entries
    pub fn containing_dir(&self, path: &EntryPath) -> PathBuf {
        match path.parent() {
            Some(parent) => self.resolve(&parent),
            None => self.root.clone(),
        }
    }

    /// Write `content` to the mirror of `path`, creating parent directories.
    pub async fn write_file(&self, path: &EntryPath, content: &str) -> Result<PathBuf, WorkspaceError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WorkspaceError::Write(target.clone(), e))?;
        }
        tokio::fs::write(&target, content)
            .await
            .map_err(|e| WorkspaceError::Write(target.clone(), e))?;

        tracing::debug!(path = %path, target = %target.display(), "mirrored file");
        Ok(target)
    }

    pub async fn remove_file(&self, path: &EntryPath) {
        let target = self.resolve(path);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => tracing::debug!(path = %path, "removed mirrored file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path, target = %target.display(), error = %e, "failed to remove mirrored file")
            }
        }
    }

    /// Remove the mirror of a folder and everything below it
    pub async fn remove_subtree(&self, path: &EntryPath) {
        let target = self.resolve(path);
        let result = match tokio::fs::symlink_metadata(&target).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&target).await,
            Ok(_) => tokio::fs::remove_file(&target).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::debug!(path = %path, "removed mirrored subtree"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path, target = %target.display(), error = %e, "failed to remove mirrored subtree")
            }
        }
    }

    /// Move the mirror of `from` (file or folder) to `to`.
    ///
    /// A missing source is not an error: content that was never synced has
    /// nothing to move.
    pub async fn move_path(&self, from: &EntryPath, to: &EntryPath) {
        let source = self.resolve(from);
        let target = self.resolve(to);

        if let Err(e) = tokio::fs::symlink_metadata(&source).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(from = %from, error = %e, "failed to inspect mirrored path");
            }
            return;
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(to = %to, error = %e, "failed to create mirror directory");
                return;
            }
        }

        match tokio::fs::rename(&source, &target).await {
            Ok(()) => tracing::debug!(from = %from, to = %to, "moved mirrored path"),
            Err(e) => {
                tracing::warn!(from = %from, to = %to, error = %e, "failed to move mirrored path")
            }
        }
    }
}
