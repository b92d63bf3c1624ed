//! Grant scopes and path-pattern matching
//!
//! A scope pairs a path pattern with a permission set. The data-access
//! boundary asks whether a requested `(path, permission)` is covered; the
//! first scope whose pattern matches the path decides, and matching is
//! case-sensitive.

use serde::{Deserialize, Serialize};

/// Wildcard marker: a pattern ending in `/*` covers descendants of the
/// prefix, but never the bare prefix itself.
const WILDCARD_SUFFIX: &str = "/*";

/// An access permission on a data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read the payload at a path
    Read,
    /// Write a payload back to a path
    Write,
}

/// One scope entry of a capability grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scope {
    /// Path pattern: exact path, or `prefix/*` for descendants
    pub path: String,
    /// Permissions granted under this pattern
    pub permissions: Vec<Permission>,
}

impl Scope {
    /// Create a scope entry.
    pub fn new(path: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            path: path.into(),
            permissions,
        }
    }

    /// Read-only scope for a path pattern.
    pub fn read(path: impl Into<String>) -> Self {
        Self::new(path, vec![Permission::Read])
    }

    /// Read-write scope for a path pattern.
    pub fn read_write(path: impl Into<String>) -> Self {
        Self::new(path, vec![Permission::Read, Permission::Write])
    }
}

/// Whether a scope pattern matches a requested path.
///
/// Exact patterns match only themselves. A `prefix/*` pattern matches any
/// path that starts with `prefix/` and has a non-empty remainder: the
/// prefix must be a `/`-bounded ancestor, never a bare substring.
pub fn scope_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix(WILDCARD_SUFFIX) {
        Some(prefix) => path
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|descendant| !descendant.is_empty()),
        None => pattern == path,
    }
}

/// Whether the requested `(path, permission)` is granted by a scope list.
///
/// The first scope whose pattern matches the path wins; later scopes are
/// not consulted even if they would grant the permission.
pub fn permits(scopes: &[Scope], path: &str, permission: Permission) -> bool {
    scopes
        .iter()
        .find(|scope| scope_matches(&scope.path, path))
        .is_some_and(|scope| scope.permissions.contains(&permission))
}
