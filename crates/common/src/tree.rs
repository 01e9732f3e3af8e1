//! Hierarchical view over a flat entry listing.
//!
//! The tree is never stored. It is rebuilt from the current listing on every
//! read, so it can never drift from the store.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::{EntryKind, EntrySummary};
use crate::path::EntryPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: Uuid,
    pub path: EntryPath,
    pub name: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_summary(summary: EntrySummary) -> Self {
        Self {
            id: summary.id,
            name: summary.path.name().to_string(),
            path: summary.path,
            kind: summary.kind,
            language: summary.language,
            children: Vec::new(),
        }
    }
}

/// Folders first, then by name, then by full path
fn sibling_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    let rank = |kind: EntryKind| if kind.is_folder() { 0 } else { 1 };
    rank(a.kind)
        .cmp(&rank(b.kind))
        .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
        .then_with(|| a.path.cmp(&b.path))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree {
    roots: Vec<TreeNode>,
}

impl FileTree {
    /// Build a tree from an unordered listing.
    ///
    /// Each entry hangs under its longest existing proper ancestor. An entry
    /// whose ancestors are all missing is placed at the root rather than
    /// dropped.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = EntrySummary>,
    {
        let mut nodes: Vec<TreeNode> = Vec::new();
        let mut index: HashMap<EntryPath, usize> = HashMap::new();
        for summary in entries {
            if index.contains_key(&summary.path) {
                tracing::warn!(path = %summary.path, "duplicate path in listing, skipping");
                continue;
            }
            index.insert(summary.path.clone(), nodes.len());
            nodes.push(TreeNode::from_summary(summary));
        }

        let parents: Vec<Option<usize>> = nodes
            .iter()
            .map(|node| {
                node.path
                    .ancestors()
                    .iter()
                    .rev()
                    .find_map(|ancestor| index.get(ancestor).copied())
            })
            .collect();

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut root_ids = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => root_ids.push(i),
            }
        }

        let mut slots: Vec<Option<TreeNode>> = nodes.into_iter().map(Some).collect();
        assemble(&mut slots, &children, &root_ids);
        let mut roots: Vec<TreeNode> = root_ids
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();
        roots.sort_by(sibling_order);

        Self { roots }
    }

    /// Top level nodes in display order
    pub fn roots(&self) -> std::slice::Iter<'_, TreeNode> {
        self.roots.iter()
    }

    /// Total number of nodes at every depth
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first pre-order traversal yielding `(depth, node)`
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().map(|n| (0, n)).collect(),
        }
    }
}

/// Move every node into its parent's `children`, deepest first.
///
/// Runs on an explicit stack so tree depth never turns into call depth.
/// Afterwards only the `roots` slots are still occupied.
fn assemble(slots: &mut [Option<TreeNode>], children: &[Vec<usize>], roots: &[usize]) {
    let mut stack: Vec<(usize, bool)> = roots.iter().map(|&i| (i, false)).collect();
    while let Some((i, expanded)) = stack.pop() {
        if !expanded {
            stack.push((i, true));
            stack.extend(children[i].iter().map(|&c| (c, false)));
            continue;
        }

        let mut kids: Vec<TreeNode> = children[i]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        kids.sort_by(sibling_order);
        if let Some(node) = slots[i].as_mut() {
            node.children = kids;
        }
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::path::MAX_DEPTH;

    fn summary(path: &str, kind: EntryKind) -> EntrySummary {
        EntrySummary {
            id: Uuid::new_v4(),
            path: EntryPath::parse(path).unwrap(),
            kind,
            language: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn paths(tree: &FileTree) -> Vec<(usize, String)> {
        tree.walk()
            .map(|(d, n)| (d, n.path.to_string()))
            .collect()
    }

    #[test]
    fn test_folders_before_files_then_by_name() {
        let tree = FileTree::build(vec![
            summary("b.js", EntryKind::File),
            summary("a", EntryKind::Folder),
            summary("a/z.js", EntryKind::File),
            summary("a/m", EntryKind::Folder),
            summary("A.js", EntryKind::File),
        ]);

        assert_eq!(
            paths(&tree),
            vec![
                (0, "a".to_string()),
                (1, "a/m".to_string()),
                (1, "a/z.js".to_string()),
                (0, "A.js".to_string()),
                (0, "b.js".to_string()),
            ]
        );
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_orphans_attach_to_nearest_existing_ancestor() {
        let tree = FileTree::build(vec![
            summary("a", EntryKind::Folder),
            summary("a/b/c/d.txt", EntryKind::File),
            summary("x/y.txt", EntryKind::File),
        ]);

        assert_eq!(
            paths(&tree),
            vec![
                (0, "a".to_string()),
                (1, "a/b/c/d.txt".to_string()),
                (0, "x/y.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut entries = vec![
            summary("src", EntryKind::Folder),
            summary("src/lib.rs", EntryKind::File),
            summary("src/bin", EntryKind::Folder),
            summary("src/bin/main.rs", EntryKind::File),
            summary("README.md", EntryKind::File),
        ];
        let forward = paths(&FileTree::build(entries.clone()));
        entries.reverse();
        let backward = paths(&FileTree::build(entries));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_roots_is_restartable() {
        let tree = FileTree::build(vec![
            summary("one", EntryKind::File),
            summary("two", EntryKind::File),
        ]);
        assert_eq!(tree.roots().count(), 2);
        assert_eq!(tree.roots().count(), 2);
        assert_eq!(tree.roots().next().unwrap().name, "one");
    }

    #[test]
    fn test_deepest_chain_builds_and_serializes() {
        let chain: Vec<EntrySummary> = (1..=MAX_DEPTH)
            .map(|depth| {
                let kind = if depth == MAX_DEPTH {
                    EntryKind::File
                } else {
                    EntryKind::Folder
                };
                summary(&vec!["d"; depth].join("/"), kind)
            })
            .rev()
            .collect();

        // Half the default thread stack.
        let tree = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || {
                let tree = FileTree::build(chain);
                let json = serde_json::to_string(&tree).unwrap();
                let decoded: FileTree = serde_json::from_str(&json).unwrap();
                assert_eq!(decoded, tree);
                tree
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(tree.len(), MAX_DEPTH);
        let (depth, leaf) = tree.walk().last().unwrap();
        assert_eq!(depth, MAX_DEPTH - 1);
        assert_eq!(leaf.kind, EntryKind::File);
    }

    #[test]
    fn test_empty_listing() {
        let tree = FileTree::build(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(serde_json::to_string(&tree).unwrap(), "[]");
    }
}
