//! Behaviour every `PathStore` must show, exercised against the memory store.

use common::prelude::*;

fn p(s: &str) -> EntryPath {
    EntryPath::parse(s).unwrap()
}

async fn create_file<S: PathStore>(store: &S, path: &str, content: &str) -> Entry {
    let path = p(path);
    let ancestors = path.ancestors();
    store
        .insert_or_fail(NewEntry::file(path, content, None), &ancestors)
        .await
        .unwrap()
}

async fn paths<S: PathStore>(store: &S) -> Vec<String> {
    let mut all: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.path.to_string())
        .collect();
    all.sort();
    all
}

#[tokio::test]
async fn test_insert_materializes_ancestors() {
    let store = MemoryPathStore::new();
    create_file(&store, "src/components/Button.js", "x").await;

    assert_eq!(
        paths(&store).await,
        vec!["src", "src/components", "src/components/Button.js"]
    );
    let folder = store.get(&p("src/components")).await.unwrap().unwrap();
    assert_eq!(folder.kind, EntryKind::Folder);
    assert_eq!(folder.content, None);
}

#[tokio::test]
async fn test_ancestor_upsert_is_idempotent() {
    let store = MemoryPathStore::new();
    let first = create_file(&store, "a/one.txt", "1").await;
    let folder_before = store.get(&p("a")).await.unwrap().unwrap();
    create_file(&store, "a/two.txt", "2").await;
    let folder_after = store.get(&p("a")).await.unwrap().unwrap();

    assert_eq!(folder_before.id, folder_after.id);
    assert_eq!(paths(&store).await, vec!["a", "a/one.txt", "a/two.txt"]);
    assert!(store.get_by_id(first.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_insert_conflict_and_file_ancestor() {
    let store = MemoryPathStore::new();
    create_file(&store, "notes", "").await;

    let err = store
        .insert_or_fail(NewEntry::folder(p("notes")), &[])
        .await
        .unwrap_err();
    assert_eq!(err, PathStoreError::Conflict(p("notes")));

    let nested = p("notes/today.md");
    let err = store
        .insert_or_fail(NewEntry::file(nested.clone(), "", None), &nested.ancestors())
        .await
        .unwrap_err();
    assert_eq!(err, PathStoreError::AncestorIsFile(p("notes")));
    assert_eq!(paths(&store).await, vec!["notes"]);
}

#[tokio::test]
async fn test_cascading_rename_preserves_suffixes() {
    let store = MemoryPathStore::new();
    create_file(&store, "a/x.js", "x").await;
    create_file(&store, "a/sub/y.js", "y").await;
    create_file(&store, "ab/y.js", "untouched").await;
    let id = store.get(&p("a/sub/y.js")).await.unwrap().unwrap().id;

    let moved = store.update_path(&p("a"), &p("z"), &[]).await.unwrap();

    assert_eq!(moved[0].path, p("z"));
    assert_eq!(moved.len(), 4);
    assert_eq!(
        paths(&store).await,
        vec!["ab", "ab/y.js", "z", "z/sub", "z/sub/y.js", "z/x.js"]
    );
    let y = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(y.path, p("z/sub/y.js"));
    assert_eq!(y.content.as_deref(), Some("y"));
}

#[tokio::test]
async fn test_cascading_rename_is_all_or_nothing() {
    let store = MemoryPathStore::new();
    create_file(&store, "a/x.js", "x").await;
    create_file(&store, "a/y.js", "y").await;
    // Leave an orphaned `z/y.js` so `z` itself is free but a descendant collides.
    create_file(&store, "z/y.js", "blocker").await;
    store.delete_one(&p("z")).await.unwrap();

    let before = paths(&store).await;
    let err = store.update_path(&p("a"), &p("z"), &[]).await.unwrap_err();
    assert_eq!(
        err,
        PathStoreError::CascadeConflict {
            root: p("a"),
            path: p("z/y.js"),
        }
    );
    assert_eq!(paths(&store).await, before);
}

#[tokio::test]
async fn test_rename_into_new_ancestors() {
    let store = MemoryPathStore::new();
    create_file(&store, "main.py", "print()").await;
    let target = p("app/src/main.py");

    let moved = store
        .update_path(&p("main.py"), &target, &target.ancestors())
        .await
        .unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(paths(&store).await, vec!["app", "app/src", "app/src/main.py"]);

    let err = store
        .update_path(&p("missing"), &p("other"), &[])
        .await
        .unwrap_err();
    assert_eq!(err, PathStoreError::NotFound(p("missing")));
}

#[tokio::test]
async fn test_rename_onto_existing_path_conflicts() {
    let store = MemoryPathStore::new();
    create_file(&store, "a.txt", "").await;
    create_file(&store, "b.txt", "").await;
    let err = store
        .update_path(&p("a.txt"), &p("b.txt"), &[])
        .await
        .unwrap_err();
    assert_eq!(err, PathStoreError::Conflict(p("b.txt")));
}

#[tokio::test]
async fn test_delete_by_prefix_is_complete_and_exact() {
    let store = MemoryPathStore::new();
    create_file(&store, "a/x.js", "").await;
    create_file(&store, "a/sub/deep/y.js", "").await;
    create_file(&store, "ab/keep.js", "").await;

    let mut removed: Vec<String> = store
        .delete_by_prefix(&p("a"))
        .await
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    removed.sort();

    assert_eq!(
        removed,
        vec!["a", "a/sub", "a/sub/deep", "a/sub/deep/y.js", "a/x.js"]
    );
    assert_eq!(paths(&store).await, vec!["ab", "ab/keep.js"]);
}

#[tokio::test]
async fn test_update_content_only_touches_files() {
    let store = MemoryPathStore::new();
    let created = create_file(&store, "dir/file.txt", "old").await;

    let updated = store
        .update_content(&p("dir/file.txt"), "new")
        .await
        .unwrap();
    assert_eq!(updated.content.as_deref(), Some("new"));
    assert_eq!(updated.id, created.id);
    assert!(updated.updated_at >= created.updated_at);

    let err = store.update_content(&p("dir"), "nope").await.unwrap_err();
    assert_eq!(err, PathStoreError::NotFound(p("dir")));
}

#[tokio::test]
async fn test_delete_one_reports_presence() {
    let store = MemoryPathStore::new();
    create_file(&store, "a.txt", "").await;
    assert!(store.delete_one(&p("a.txt")).await.unwrap());
    assert!(!store.delete_one(&p("a.txt")).await.unwrap());
    assert!(!store.exists(&p("a.txt")).await.unwrap());
}
