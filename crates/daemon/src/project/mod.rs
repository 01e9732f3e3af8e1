//! Structural operations over a project.
//!
//! Every mutation is a single store batch under an exclusive lock on the
//! affected path subtree. The disk mirror is only touched after the store has
//! committed, and mirror trouble never undoes a committed change.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use common::language::language_for_path;
use common::prelude::*;

use crate::workspace::Workspace;

mod error;
mod lock;

pub use error::ProjectError;
pub use lock::{PrefixGuard, PrefixLocks};

/// How a client names an entry: by stable id or by current path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    Id(Uuid),
    Path(EntryPath),
}

impl EntryRef {
    /// Anything that parses as a UUID is treated as an id.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let raw = raw.trim().trim_matches('/');
        match Uuid::parse_str(raw) {
            Ok(id) => Ok(EntryRef::Id(id)),
            Err(_) => Ok(EntryRef::Path(EntryPath::parse(raw)?)),
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRef::Id(id) => write!(f, "{id}"),
            EntryRef::Path(path) => write!(f, "{path}"),
        }
    }
}

impl From<EntryPath> for EntryRef {
    fn from(path: EntryPath) -> Self {
        EntryRef::Path(path)
    }
}

impl From<Uuid> for EntryRef {
    fn from(id: Uuid) -> Self {
        EntryRef::Id(id)
    }
}

/// Result of mirroring an entry to disk
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub entry: Entry,
    /// Where the file was written; `None` for folders
    pub written: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Project<S: PathStore> {
    store: S,
    workspace: Workspace,
    locks: Arc<PrefixLocks>,
}

impl<S: PathStore> Project<S> {
    pub fn new(store: S, workspace: Workspace) -> Self {
        Self {
            store,
            workspace,
            locks: PrefixLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Every entry without content, ordered by path
    pub async fn list(&self) -> Result<Vec<EntrySummary>, ProjectError> {
        let mut entries: Vec<EntrySummary> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(EntrySummary::from)
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    pub async fn tree(&self) -> Result<FileTree, ProjectError> {
        let entries = self.store.list().await?;
        Ok(FileTree::build(entries.into_iter().map(EntrySummary::from)))
    }

    pub async fn resolve(&self, reference: &EntryRef) -> Result<Entry, ProjectError> {
        let found = match reference {
            EntryRef::Id(id) => self.store.get_by_id(*id).await?,
            EntryRef::Path(path) => self.store.get(path).await?,
        };
        found.ok_or_else(|| ProjectError::NotFound(reference.to_string()))
    }

    pub async fn get(&self, reference: &EntryRef) -> Result<Entry, ProjectError> {
        self.resolve(reference).await
    }

    /// Resolve `reference` and lock its path, plus `also` when given.
    ///
    /// Re-checks the entry after the lock is held, since a rename may have
    /// moved it while we waited.
    async fn lock_entry(
        &self,
        reference: &EntryRef,
        also: Option<&EntryPath>,
    ) -> Result<(Entry, PrefixGuard), ProjectError> {
        loop {
            let entry = self.resolve(reference).await?;
            let mut paths = vec![entry.path.clone()];
            paths.extend(also.cloned());
            let guard = self.locks.acquire(paths).await;

            let current = self.store.get_by_id(entry.id).await?;
            match current {
                Some(current) if current.path == entry.path => return Ok((current, guard)),
                Some(_) => continue,
                None => return Err(ProjectError::NotFound(reference.to_string())),
            }
        }
    }

    async fn mirror(&self, entry: &Entry) {
        if let Some(content) = entry.content.as_deref() {
            if let Err(e) = self.workspace.write_file(&entry.path, content).await {
                tracing::warn!(path = %entry.path, error = %e, "mirror write failed");
            }
        }
    }

    /// Create a file or folder, materializing any missing ancestor folders.
    #[tracing::instrument(skip(self, content))]
    pub async fn create(
        &self,
        path: EntryPath,
        kind: EntryKind,
        content: Option<String>,
        language: Option<String>,
    ) -> Result<Entry, ProjectError> {
        let new_entry = match kind {
            EntryKind::Folder => NewEntry::folder(path.clone()),
            EntryKind::File => {
                let language =
                    language.unwrap_or_else(|| language_for_path(&path).to_string());
                NewEntry::file(path.clone(), content.unwrap_or_default(), Some(language))
            }
        };

        let _guard = self.locks.acquire(vec![path.clone()]).await;
        let entry = self
            .store
            .insert_or_fail(new_entry, &path.ancestors())
            .await?;
        tracing::info!(id = %entry.id, "created entry");

        self.mirror(&entry).await;
        Ok(entry)
    }

    /// Move an entry, and for folders every descendant, to `new_path`.
    #[tracing::instrument(skip(self))]
    pub async fn rename(
        &self,
        reference: &EntryRef,
        new_path: EntryPath,
    ) -> Result<Entry, ProjectError> {
        let (entry, _guard) = self.lock_entry(reference, Some(&new_path)).await?;
        let old_path = entry.path.clone();

        if old_path == new_path {
            return Ok(entry);
        }
        if new_path.is_descendant_of(&old_path) {
            return Err(ProjectError::Invalid(format!(
                "cannot move {old_path} inside itself"
            )));
        }

        if entry.is_folder() {
            for moving in self.store.list().await? {
                if let Some(target) = moving.path.rebase(&old_path, &new_path) {
                    target.check_limits()?;
                }
            }
        }

        let moved = self
            .store
            .update_path(&old_path, &new_path, &new_path.ancestors())
            .await?;
        tracing::info!(from = %old_path, to = %new_path, count = moved.len(), "renamed");

        self.workspace.move_path(&old_path, &new_path).await;

        moved
            .into_iter()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| ProjectError::NotFound(new_path.to_string()))
    }

    /// Replace a file's content and rewrite its mirror
    #[tracing::instrument(skip(self, content))]
    pub async fn update_content(
        &self,
        reference: &EntryRef,
        content: String,
    ) -> Result<Entry, ProjectError> {
        let (entry, _guard) = self.lock_entry(reference, None).await?;
        if entry.is_folder() {
            return Err(ProjectError::Invalid(format!(
                "{} is a folder and has no content",
                entry.path
            )));
        }

        let updated = self.store.update_content(&entry.path, &content).await?;
        self.mirror(&updated).await;
        Ok(updated)
    }

    /// Rename and/or rewrite content. The rename happens first.
    pub async fn update(
        &self,
        reference: &EntryRef,
        path: Option<EntryPath>,
        content: Option<String>,
    ) -> Result<Entry, ProjectError> {
        if path.is_none() && content.is_none() {
            return Err(ProjectError::Invalid(
                "nothing to update: provide a path or content".into(),
            ));
        }

        let mut entry = self.resolve(reference).await?;
        if content.is_some() && entry.is_folder() {
            return Err(ProjectError::Invalid(format!(
                "{} is a folder and has no content",
                entry.path
            )));
        }

        if let Some(path) = path {
            entry = self.rename(&EntryRef::Id(entry.id), path).await?;
        }
        if let Some(content) = content {
            entry = self.update_content(&EntryRef::Id(entry.id), content).await?;
        }
        Ok(entry)
    }

    /// Delete an entry. Folders take their whole subtree with them.
    ///
    /// Returns every removed path.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, reference: &EntryRef) -> Result<Vec<EntryPath>, ProjectError> {
        let (entry, _guard) = self.lock_entry(reference, None).await?;

        let removed = match entry.kind {
            EntryKind::File => {
                if !self.store.delete_one(&entry.path).await? {
                    return Err(ProjectError::NotFound(reference.to_string()));
                }
                self.workspace.remove_file(&entry.path).await;
                vec![entry.path]
            }
            EntryKind::Folder => {
                let removed = self.store.delete_by_prefix(&entry.path).await?;
                self.workspace.remove_subtree(&entry.path).await;
                removed
            }
        };
        tracing::info!(count = removed.len(), "deleted");
        Ok(removed)
    }

    /// Write a file's stored content to the mirror. Folders are a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self, reference: &EntryRef) -> Result<SyncOutcome, ProjectError> {
        let (entry, _guard) = self.lock_entry(reference, None).await?;
        let written = match (&entry.kind, entry.content.as_deref()) {
            (EntryKind::File, content) => Some(
                self.workspace
                    .write_file(&entry.path, content.unwrap_or_default())
                    .await?,
            ),
            (EntryKind::Folder, _) => None,
        };
        Ok(SyncOutcome { entry, written })
    }

    /// Directory a terminal opened for `file_ref` should start in.
    ///
    /// Only a file ref moves the shell: the file is mirrored first so the
    /// shell sees its current content, and the shell starts next to it.
    /// Folders, client placeholders (`new-...`), unknown refs and failures
    /// all start at the workspace root.
    pub async fn working_dir_for(&self, file_ref: Option<&str>) -> PathBuf {
        let root = self.workspace.root().to_path_buf();
        let Some(raw) = file_ref.map(str::trim).filter(|r| !r.is_empty()) else {
            return root;
        };
        if raw.starts_with("new-") {
            return root;
        }

        let reference = match EntryRef::parse(raw) {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!(file_ref = raw, error = %e, "unusable terminal file ref");
                return root;
            }
        };

        match self.sync(&reference).await {
            Ok(SyncOutcome {
                written: Some(_),
                entry,
            }) => self.workspace.containing_dir(&entry.path),
            Ok(SyncOutcome { written: None, .. }) => {
                tracing::debug!(file_ref = raw, "terminal ref is a folder, using workspace root");
                root
            }
            Err(e) => {
                tracing::warn!(file_ref = raw, error = %e, "falling back to workspace root");
                root
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use common::path::MAX_DEPTH;
    use tempfile::TempDir;

    use super::*;

    fn p(s: &str) -> EntryPath {
        EntryPath::parse(s).unwrap()
    }

    async fn setup() -> (Project<MemoryPathStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::open(dir.path().join("workspace")).await.unwrap();
        (Project::new(MemoryPathStore::new(), workspace), dir)
    }

    #[test]
    fn test_entry_ref_parse() {
        let id = Uuid::new_v4();
        assert_eq!(EntryRef::parse(&id.to_string()).unwrap(), EntryRef::Id(id));
        assert_eq!(
            EntryRef::parse("/src/app.js").unwrap(),
            EntryRef::Path(p("src/app.js"))
        );
        assert!(EntryRef::parse("a/../b").is_err());
    }

    #[tokio::test]
    async fn test_create_defaults_language_and_mirrors() {
        let (project, dir) = setup().await;
        let entry = project
            .create(p("src/index.ts"), EntryKind::File, Some("let x = 1".into()), None)
            .await
            .unwrap();

        assert_eq!(entry.language.as_deref(), Some("typescript"));
        let mirrored = dir.path().join("workspace/src/index.ts");
        assert_eq!(std::fs::read_to_string(mirrored).unwrap(), "let x = 1");

        let folder = project
            .create(p("docs"), EntryKind::Folder, Some("x".into()), Some("md".into()))
            .await
            .unwrap();
        assert_eq!(folder.content, None);
        assert_eq!(folder.language, None);
    }

    #[tokio::test]
    async fn test_create_under_file_is_conflict() {
        let (project, _dir) = setup().await;
        project
            .create(p("notes"), EntryKind::File, None, None)
            .await
            .unwrap();
        let err = project
            .create(p("notes/a.md"), EntryKind::File, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::Conflict(path) if path == p("notes")));
    }

    #[tokio::test]
    async fn test_rename_rules() {
        let (project, _dir) = setup().await;
        let folder = project
            .create(p("a"), EntryKind::Folder, None, None)
            .await
            .unwrap();
        project
            .create(p("a/x.js"), EntryKind::File, None, None)
            .await
            .unwrap();

        let same = project.rename(&p("a").into(), p("a")).await.unwrap();
        assert_eq!(same.id, folder.id);

        let err = project.rename(&p("a").into(), p("a/b")).await.unwrap_err();
        assert!(matches!(err, ProjectError::Invalid(_)));

        let moved = project.rename(&folder.id.into(), p("z")).await.unwrap();
        assert_eq!(moved.path, p("z"));
        assert!(project.get(&p("z/x.js").into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_cannot_push_descendants_past_depth_limit() {
        let (project, _dir) = setup().await;
        let deep = vec!["d"; MAX_DEPTH].join("/");
        project
            .create(p(&deep), EntryKind::File, None, None)
            .await
            .unwrap();

        let err = project
            .rename(&p("d").into(), p("x/y"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::Invalid(_)));
        assert!(project.get(&p(&deep).into()).await.is_ok());
        assert!(project.get(&p("x").into()).await.is_err());

        let moved = project.rename(&p("d").into(), p("e")).await.unwrap();
        assert_eq!(moved.path, p("e"));
    }

    #[tokio::test]
    async fn test_update_requires_something() {
        let (project, _dir) = setup().await;
        project
            .create(p("a.txt"), EntryKind::File, None, None)
            .await
            .unwrap();
        let err = project.update(&p("a.txt").into(), None, None).await.unwrap_err();
        assert!(matches!(err, ProjectError::Invalid(_)));

        let updated = project
            .update(&p("a.txt").into(), Some(p("b/a.txt")), Some("hi".into()))
            .await
            .unwrap();
        assert_eq!(updated.path, p("b/a.txt"));
        assert_eq!(updated.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_folder_content_is_invalid() {
        let (project, _dir) = setup().await;
        project
            .create(p("dir"), EntryKind::Folder, None, None)
            .await
            .unwrap();
        let err = project
            .update_content(&p("dir").into(), "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (project, _dir) = setup().await;
        let err = project.delete(&p("ghost").into()).await.unwrap_err();
        assert!(matches!(err, ProjectError::NotFound(_)));
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_working_dir_for_file_ref() {
        let (project, dir) = setup().await;
        let entry = project
            .create(p("proj/main.py"), EntryKind::File, Some("print(1)".into()), None)
            .await
            .unwrap();
        std::fs::remove_dir_all(dir.path().join("workspace/proj")).unwrap();

        let cwd = project.working_dir_for(Some(&entry.id.to_string())).await;
        assert_eq!(cwd, dir.path().join("workspace/proj"));
        assert!(cwd.join("main.py").exists());

        let root = dir.path().join("workspace");
        assert_eq!(project.working_dir_for(None).await, root);
        assert_eq!(project.working_dir_for(Some("new-1700000000")).await, root);
        assert_eq!(project.working_dir_for(Some("missing.txt")).await, root);

        assert_eq!(project.working_dir_for(Some("proj")).await, root);
        project
            .create(p("empty/dir"), EntryKind::Folder, None, None)
            .await
            .unwrap();
        assert_eq!(project.working_dir_for(Some("empty/dir")).await, root);
        assert!(!root.join("empty/dir").exists());
    }
}
