//! Slash-delimited entry paths.
//!
//! A path is both the identity of an entry and the encoding of its place in
//! the hierarchy: `src/components/Button.js` lives under the folder
//! `src/components`, which lives under `src`. All hierarchy questions are
//! answered by comparing whole segments, never by pattern matching on the
//! raw string, so segment names may contain any character the filesystem
//! mirror can represent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between path segments
pub const SEPARATOR: char = '/';

/// Deepest path accepted. Keeps the nested tree view well inside JSON
/// nesting limits and recursion depth of clients decoding it.
pub const MAX_DEPTH: usize = 48;

/// Longest path accepted, in bytes
pub const MAX_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path contains an empty segment: {0}")]
    EmptySegment(String),
    #[error("path contains a relative segment: {0}")]
    RelativeSegment(String),
    #[error("path contains an invalid character: {0:?}")]
    InvalidCharacter(char),
    #[error("path has {0} segments, the limit is {}", MAX_DEPTH)]
    TooDeep(usize),
    #[error("path is {0} bytes long, the limit is {}", MAX_LEN)]
    TooLong(usize),
}

/// A validated, normalized entry path.
///
/// Leading and trailing separators are stripped on parse. Empty, `.` and `..`
/// segments are rejected so a path can always be joined under a directory
/// without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryPath(String);

impl EntryPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim().trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        check_limits(trimmed)?;

        if let Some(c) = trimmed.chars().find(|c| *c == '\0' || *c == '\\') {
            return Err(PathError::InvalidCharacter(c));
        }

        for segment in trimmed.split(SEPARATOR) {
            match segment {
                "" => return Err(PathError::EmptySegment(trimmed.to_string())),
                "." | ".." => return Err(PathError::RelativeSegment(trimmed.to_string())),
                _ => {}
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this path is still within [`MAX_DEPTH`] and [`MAX_LEN`].
    ///
    /// Parsed paths always are; paths produced by [`EntryPath::rebase`] may
    /// not be.
    pub fn check_limits(&self) -> Result<(), PathError> {
        check_limits(&self.0)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Number of segments; a root-level entry has depth 1
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The last segment
    pub fn name(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    /// Extension of the last segment, without the dot.
    ///
    /// Dotfiles such as `.env` have no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]),
        }
    }

    /// The containing folder, or `None` for a root-level entry
    pub fn parent(&self) -> Option<EntryPath> {
        self.0
            .rfind(SEPARATOR)
            .map(|pos| EntryPath(self.0[..pos].to_string()))
    }

    /// Every proper prefix of this path, shallowest first.
    ///
    /// `a/b/c` yields `a`, `a/b`.
    pub fn ancestors(&self) -> Vec<EntryPath> {
        self.0
            .match_indices(SEPARATOR)
            .map(|(pos, _)| EntryPath(self.0[..pos].to_string()))
            .collect()
    }

    /// True when `self` equals `other` or lives anywhere beneath it
    pub fn is_within(&self, other: &EntryPath) -> bool {
        self == other || self.is_descendant_of(other)
    }

    /// True when `self` lives strictly beneath `other`
    pub fn is_descendant_of(&self, other: &EntryPath) -> bool {
        self.0.len() > other.0.len()
            && self.0.starts_with(other.as_str())
            && self.0[other.0.len()..].starts_with(SEPARATOR)
    }

    /// True when either path is within the other
    pub fn overlaps(&self, other: &EntryPath) -> bool {
        self.is_within(other) || other.is_within(self)
    }

    /// Replace the `from` prefix with `to`, keeping the remainder byte for byte.
    ///
    /// Returns `None` when `self` is not within `from`.
    pub fn rebase(&self, from: &EntryPath, to: &EntryPath) -> Option<EntryPath> {
        if self == from {
            return Some(to.clone());
        }
        if !self.is_descendant_of(from) {
            return None;
        }
        let suffix = &self.0[from.0.len()..];
        Some(EntryPath(format!("{}{}", to.0, suffix)))
    }
}

fn check_limits(raw: &str) -> Result<(), PathError> {
    if raw.len() > MAX_LEN {
        return Err(PathError::TooLong(raw.len()));
    }
    let depth = raw.matches(SEPARATOR).count() + 1;
    if depth > MAX_DEPTH {
        return Err(PathError::TooDeep(depth));
    }
    Ok(())
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for EntryPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryPath::parse(s)
    }
}

impl TryFrom<String> for EntryPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EntryPath::parse(&value)
    }
}

impl From<EntryPath> for String {
    fn from(path: EntryPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> EntryPath {
        EntryPath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_normalizes_separators() {
        assert_eq!(p("/src/main.rs/").as_str(), "src/main.rs");
        assert_eq!(p("  notes.txt ").as_str(), "notes.txt");
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert_eq!(EntryPath::parse(""), Err(PathError::Empty));
        assert_eq!(EntryPath::parse("///"), Err(PathError::Empty));
        assert!(matches!(
            EntryPath::parse("a//b"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            EntryPath::parse("a/../b"),
            Err(PathError::RelativeSegment(_))
        ));
        assert!(matches!(
            EntryPath::parse("./a"),
            Err(PathError::RelativeSegment(_))
        ));
        assert_eq!(
            EntryPath::parse("a\\b"),
            Err(PathError::InvalidCharacter('\\'))
        );
    }

    #[test]
    fn test_parse_enforces_limits() {
        let deepest = vec!["a"; MAX_DEPTH].join("/");
        assert_eq!(p(&deepest).depth(), MAX_DEPTH);

        let too_deep = vec!["a"; 6000].join("/");
        assert_eq!(EntryPath::parse(&too_deep), Err(PathError::TooDeep(6000)));

        let too_long = "x".repeat(MAX_LEN + 1);
        assert_eq!(
            EntryPath::parse(&too_long),
            Err(PathError::TooLong(MAX_LEN + 1))
        );
    }

    #[test]
    fn test_rebase_can_exceed_limits() {
        let deepest = p(&vec!["a"; MAX_DEPTH].join("/"));
        let moved = deepest.rebase(&p("a"), &p("b/c")).unwrap();
        assert_eq!(moved.depth(), MAX_DEPTH + 1);
        assert_eq!(moved.check_limits(), Err(PathError::TooDeep(MAX_DEPTH + 1)));
    }

    #[test]
    fn test_name_parent_and_extension() {
        let path = p("src/components/Button.js");
        assert_eq!(path.name(), "Button.js");
        assert_eq!(path.parent(), Some(p("src/components")));
        assert_eq!(path.extension(), Some("js"));
        assert_eq!(path.depth(), 3);

        assert_eq!(p("README").parent(), None);
        assert_eq!(p("README").extension(), None);
        assert_eq!(p("config/.env").extension(), None);
        assert_eq!(p("archive.tar.gz").extension(), Some("gz"));
    }

    #[test]
    fn test_ancestors_shallowest_first() {
        assert_eq!(p("a/b/c").ancestors(), vec![p("a"), p("a/b")]);
        assert!(p("a").ancestors().is_empty());
    }

    #[test]
    fn test_descendant_is_segment_wise() {
        assert!(p("a/x.js").is_descendant_of(&p("a")));
        assert!(p("a/sub/y.js").is_descendant_of(&p("a")));
        assert!(!p("ab/x.js").is_descendant_of(&p("a")));
        assert!(!p("a").is_descendant_of(&p("a")));
        assert!(p("a").is_within(&p("a")));
        assert!(p("a/b").overlaps(&p("a")));
        assert!(p("a").overlaps(&p("a/b")));
        assert!(!p("a").overlaps(&p("ab")));
    }

    #[test]
    fn test_pattern_characters_are_literal() {
        // Segment names with regex metacharacters must not match loosely.
        let folder = p("lib(v1).*");
        assert!(p("lib(v1).*/mod.rs").is_descendant_of(&folder));
        assert!(!p("lib(v1)xx/mod.rs").is_descendant_of(&folder));
    }

    #[test]
    fn test_rebase_preserves_suffix() {
        let from = p("a");
        let to = p("z");
        assert_eq!(p("a").rebase(&from, &to), Some(p("z")));
        assert_eq!(p("a/x.js").rebase(&from, &to), Some(p("z/x.js")));
        assert_eq!(p("a/sub/y.js").rebase(&from, &to), Some(p("z/sub/y.js")));
        assert_eq!(p("ab/y.js").rebase(&from, &to), None);
    }

    #[test]
    fn test_serde_validates() {
        let path: EntryPath = serde_json::from_str("\"/src/lib.rs\"").unwrap();
        assert_eq!(path.as_str(), "src/lib.rs");
        assert!(serde_json::from_str::<EntryPath>("\"a/../b\"").is_err());
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"src/lib.rs\"");
    }
}
