use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{PathStore, PathStoreError};
use crate::entry::{Entry, EntryKind, NewEntry};
use crate::path::EntryPath;

/// The in-memory store cannot fail
pub type MemoryPathStoreError = std::convert::Infallible;

type Result<T> = std::result::Result<T, PathStoreError<MemoryPathStoreError>>;

/// A [`PathStore`] over a shared ordered map.
///
/// Each call runs entirely under the write lock, which gives the same
/// all-or-nothing behaviour the SQL store gets from transactions.
#[derive(Debug, Clone, Default)]
pub struct MemoryPathStore {
    entries: Arc<RwLock<BTreeMap<EntryPath, Entry>>>,
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn check_ancestors(map: &BTreeMap<EntryPath, Entry>, ancestors: &[EntryPath]) -> Result<()> {
    for ancestor in ancestors {
        if let Some(existing) = map.get(ancestor) {
            if existing.kind == EntryKind::File {
                return Err(PathStoreError::AncestorIsFile(ancestor.clone()));
            }
        }
    }
    Ok(())
}

fn upsert_ancestors(
    map: &mut BTreeMap<EntryPath, Entry>,
    ancestors: &[EntryPath],
    now: OffsetDateTime,
) {
    for ancestor in ancestors {
        map.entry(ancestor.clone())
            .or_insert_with(|| Entry::implicit_folder(ancestor.clone(), now));
    }
}

#[async_trait]
impl PathStore for MemoryPathStore {
    type Error = MemoryPathStoreError;

    async fn get(&self, path: &EntryPath) -> Result<Option<Entry>> {
        Ok(self.entries.read().get(path).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entry>> {
        Ok(self
            .entries
            .read()
            .values()
            .find(|entry| entry.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Entry>> {
        Ok(self.entries.read().values().cloned().collect())
    }

    async fn insert_or_fail(&self, entry: NewEntry, ancestors: &[EntryPath]) -> Result<Entry> {
        let mut map = self.entries.write();
        if map.contains_key(&entry.path) {
            return Err(PathStoreError::Conflict(entry.path));
        }
        check_ancestors(&map, ancestors)?;

        let now = OffsetDateTime::now_utc();
        upsert_ancestors(&mut map, ancestors, now);
        let entry = entry.into_entry(now);
        map.insert(entry.path.clone(), entry.clone());
        Ok(entry)
    }

    async fn update_path(
        &self,
        old: &EntryPath,
        new: &EntryPath,
        ancestors: &[EntryPath],
    ) -> Result<Vec<Entry>> {
        let mut map = self.entries.write();
        let root = map
            .get(old)
            .cloned()
            .ok_or_else(|| PathStoreError::NotFound(old.clone()))?;
        if old == new {
            return Ok(vec![root]);
        }
        if map.contains_key(new) {
            return Err(PathStoreError::Conflict(new.clone()));
        }
        check_ancestors(&map, ancestors)?;

        let moving: Vec<EntryPath> = map
            .keys()
            .filter(|path| path.is_within(old))
            .cloned()
            .collect();

        let mut rewrites = Vec::with_capacity(moving.len());
        for path in &moving {
            let Some(target) = path.rebase(old, new) else {
                continue;
            };
            if map.contains_key(&target) && !target.is_within(old) {
                return Err(PathStoreError::CascadeConflict {
                    root: old.clone(),
                    path: target,
                });
            }
            rewrites.push((path.clone(), target));
        }

        let now = OffsetDateTime::now_utc();
        upsert_ancestors(&mut map, ancestors, now);

        let mut moved = Vec::with_capacity(rewrites.len());
        for (from, _) in &rewrites {
            if let Some(entry) = map.remove(from) {
                moved.push(entry);
            }
        }

        let mut result = Vec::with_capacity(moved.len());
        for (mut entry, (_, target)) in moved.into_iter().zip(rewrites) {
            entry.path = target;
            entry.updated_at = now;
            map.insert(entry.path.clone(), entry.clone());
            result.push(entry);
        }
        result.sort_by(|a, b| a.path.depth().cmp(&b.path.depth()).then(a.path.cmp(&b.path)));
        Ok(result)
    }

    async fn update_content(&self, path: &EntryPath, content: &str) -> Result<Entry> {
        let mut map = self.entries.write();
        match map.get_mut(path) {
            Some(entry) if entry.kind == EntryKind::File => {
                entry.content = Some(content.to_string());
                entry.updated_at = OffsetDateTime::now_utc();
                Ok(entry.clone())
            }
            _ => Err(PathStoreError::NotFound(path.clone())),
        }
    }

    async fn delete_one(&self, path: &EntryPath) -> Result<bool> {
        Ok(self.entries.write().remove(path).is_some())
    }

    async fn delete_by_prefix(&self, prefix: &EntryPath) -> Result<Vec<EntryPath>> {
        let mut map = self.entries.write();
        let doomed: Vec<EntryPath> = map
            .keys()
            .filter(|path| path.is_within(prefix))
            .cloned()
            .collect();
        for path in &doomed {
            map.remove(path);
        }
        Ok(doomed)
    }
}
