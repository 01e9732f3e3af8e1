use std::fmt::Display;

use common::prelude::*;

use crate::workspace::WorkspaceError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Malformed or semantically invalid input
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("path already exists: {0}")]
    Conflict(EntryPath),
    #[error("entry not found: {0}")]
    NotFound(String),
    /// A cascading rename would have overwritten an existing entry. Nothing
    /// was changed.
    #[error("moving {root} would overwrite {path}")]
    CascadeConflict { root: EntryPath, path: EntryPath },
    #[error("store error: {0}")]
    Store(String),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl ProjectError {
    /// Stable machine readable tag for API consumers
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectError::Invalid(_) => "invalid",
            ProjectError::Conflict(_) => "conflict",
            ProjectError::NotFound(_) => "not_found",
            ProjectError::CascadeConflict { .. } => "cascade_conflict",
            ProjectError::Store(_) | ProjectError::Workspace(_) => "internal",
        }
    }
}

impl From<PathError> for ProjectError {
    fn from(err: PathError) -> Self {
        ProjectError::Invalid(err.to_string())
    }
}

impl<E: Display> From<PathStoreError<E>> for ProjectError {
    fn from(err: PathStoreError<E>) -> Self {
        match err {
            PathStoreError::Provider(e) => ProjectError::Store(e.to_string()),
            PathStoreError::NotFound(path) => ProjectError::NotFound(path.to_string()),
            PathStoreError::Conflict(path) => ProjectError::Conflict(path),
            PathStoreError::AncestorIsFile(path) => ProjectError::Conflict(path),
            PathStoreError::CascadeConflict { root, path } => {
                ProjectError::CascadeConflict { root, path }
            }
        }
    }
}
