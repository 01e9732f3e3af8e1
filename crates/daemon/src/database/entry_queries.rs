use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::*;

use crate::database::Database;

type Result<T> = std::result::Result<T, PathStoreError<sqlx::Error>>;

const ENTRY_COLUMNS: &str = "id, path, kind, content, language, created_at, updated_at";

// `?1` is the prefix. Matches the prefix itself and anything strictly below it
// by comparing the leading characters, so no pattern syntax is involved.
const WITHIN_PREFIX: &str = "(path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/')";

fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn row_to_entry(row: &SqliteRow) -> std::result::Result<Entry, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let path: String = row.try_get("path")?;
    let kind: String = row.try_get("kind")?;

    Ok(Entry {
        id: Uuid::parse_str(&id).map_err(decode_error)?,
        path: EntryPath::parse(&path).map_err(decode_error)?,
        kind: kind.parse().map_err(decode_error)?,
        content: row.try_get("content")?,
        language: row.try_get("language")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Upsert each ancestor as a folder, then make sure none of them is a file.
async fn ensure_ancestors(
    tx: &mut Transaction<'_, Sqlite>,
    ancestors: &[EntryPath],
    now: OffsetDateTime,
) -> Result<()> {
    for ancestor in ancestors {
        sqlx::query(
            r#"
            INSERT INTO entries (id, path, kind, content, language, created_at, updated_at)
            VALUES (?1, ?2, 'folder', NULL, NULL, ?3, ?3)
            ON CONFLICT(path) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(ancestor.as_str())
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    for ancestor in ancestors {
        let kind: Option<String> = sqlx::query_scalar("SELECT kind FROM entries WHERE path = ?1")
            .bind(ancestor.as_str())
            .fetch_optional(&mut **tx)
            .await?;
        if kind.as_deref() == Some(EntryKind::File.as_str()) {
            return Err(PathStoreError::AncestorIsFile(ancestor.clone()));
        }
    }

    Ok(())
}

impl Database {
    /// Work out which path blocked a rename after the transaction rolled back
    async fn find_rename_collision(&self, old: &EntryPath, new: &EntryPath) -> Result<EntryPath> {
        if self.exists(new).await? {
            return Ok(new.clone());
        }

        let collision: Option<String> = sqlx::query_scalar(
            r#"
            SELECT target.path
            FROM entries AS moving
            JOIN entries AS target
              ON target.path = ?2 || substr(moving.path, length(?1) + 1)
            WHERE substr(moving.path, 1, length(?1) + 1) = ?1 || '/'
            LIMIT 1
            "#,
        )
        .bind(old.as_str())
        .bind(new.as_str())
        .fetch_optional(&**self)
        .await?;

        match collision {
            Some(path) => Ok(EntryPath::parse(&path).map_err(decode_error)?),
            None => Ok(new.clone()),
        }
    }
}

#[async_trait]
impl PathStore for Database {
    type Error = sqlx::Error;

    async fn get(&self, path: &EntryPath) -> Result<Option<Entry>> {
        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE path = ?1"
        ))
        .bind(path.as_str())
        .fetch_optional(&**self)
        .await?;

        Ok(row.as_ref().map(row_to_entry).transpose()?)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entry>> {
        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&**self)
            .await?;

        Ok(row.as_ref().map(row_to_entry).transpose()?)
    }

    async fn list(&self) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY path"
        ))
        .fetch_all(&**self)
        .await?;

        Ok(rows
            .iter()
            .map(row_to_entry)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn insert_or_fail(&self, entry: NewEntry, ancestors: &[EntryPath]) -> Result<Entry> {
        let now = OffsetDateTime::now_utc();
        let entry = entry.into_entry(now);

        let mut tx = self.begin().await?;
        ensure_ancestors(&mut tx, ancestors, now).await?;

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO entries ({ENTRY_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.id.to_string())
        .bind(entry.path.as_str())
        .bind(entry.kind.as_str())
        .bind(entry.content.as_deref())
        .bind(entry.language.as_deref())
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                return Err(PathStoreError::Conflict(entry.path));
            }
            Err(e) => return Err(e.into()),
        };
        let created = row_to_entry(&row)?;
        tx.commit().await?;

        Ok(created)
    }

    async fn update_path(
        &self,
        old: &EntryPath,
        new: &EntryPath,
        ancestors: &[EntryPath],
    ) -> Result<Vec<Entry>> {
        if old == new {
            return match self.get(old).await? {
                Some(entry) => Ok(vec![entry]),
                None => Err(PathStoreError::NotFound(old.clone())),
            };
        }

        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;
        ensure_ancestors(&mut tx, ancestors, now).await?;

        // One statement rewrites the root and every descendant. The UNIQUE
        // index aborts the whole statement on the first collision.
        let updated = sqlx::query(&format!(
            r#"
            UPDATE entries
            SET path = ?2 || substr(path, length(?1) + 1),
                updated_at = ?3
            WHERE {WITHIN_PREFIX}
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(old.as_str())
        .bind(new.as_str())
        .bind(now)
        .fetch_all(&mut *tx)
        .await;

        let rows = match updated {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                let path = self.find_rename_collision(old, new).await?;
                return Err(if &path == new {
                    PathStoreError::Conflict(path)
                } else {
                    PathStoreError::CascadeConflict {
                        root: old.clone(),
                        path,
                    }
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut moved = rows
            .iter()
            .map(row_to_entry)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if !moved.iter().any(|entry| &entry.path == new) {
            return Err(PathStoreError::NotFound(old.clone()));
        }
        tx.commit().await?;

        moved.sort_by(|a, b| {
            a.path
                .depth()
                .cmp(&b.path.depth())
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(moved)
    }

    async fn update_content(&self, path: &EntryPath, content: &str) -> Result<Entry> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE entries
            SET content = ?2, updated_at = ?3
            WHERE path = ?1 AND kind = 'file'
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(path.as_str())
        .bind(content)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&**self)
        .await?;

        match row {
            Some(row) => Ok(row_to_entry(&row)?),
            None => Err(PathStoreError::NotFound(path.clone())),
        }
    }

    async fn delete_one(&self, path: &EntryPath) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE path = ?1")
            .bind(path.as_str())
            .execute(&**self)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_prefix(&self, prefix: &EntryPath) -> Result<Vec<EntryPath>> {
        let removed: Vec<String> = sqlx::query_scalar(&format!(
            "DELETE FROM entries WHERE {WITHIN_PREFIX} RETURNING path"
        ))
        .bind(prefix.as_str())
        .fetch_all(&**self)
        .await?;

        removed
            .iter()
            .map(|path| EntryPath::parse(path).map_err(|e| decode_error(e).into()))
            .collect()
    }
}
