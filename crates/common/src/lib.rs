//! Data model shared by the codepad daemon and its clients.
//!
//! A project is a flat collection of [`Entry`] records keyed by
//! [`EntryPath`]. The hierarchy is implied by path prefixes and is only
//! materialized on demand by [`tree::FileTree`].

pub mod entry;
pub mod language;
pub mod path;
pub mod store;
pub mod tree;

pub mod prelude {
    pub use crate::entry::{Entry, EntryKind, EntrySummary, NewEntry};
    pub use crate::language::language_for_path;
    pub use crate::path::{EntryPath, PathError};
    pub use crate::store::{MemoryPathStore, PathStore, PathStoreError};
    pub use crate::tree::{FileTree, TreeNode};
}

pub use entry::{Entry, EntryKind, EntrySummary, NewEntry};
pub use path::{EntryPath, PathError};
