//! Storage backend abstraction.
//!
//! Callers only see paths below the backend's root. A "directory" is whatever
//! grouping the backend uses for a shared prefix: deleting one removes every
//! path under that prefix, which an object store can do as well as a disk.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncRead;

/// Byte-level storage operations every backend provides.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name of the backend, for logs.
    fn name(&self) -> &'static str;

    /// Root every path must lie within.
    fn root(&self) -> &Path;

    /// Writes `bytes` to `path`, replacing any previous content. Missing
    /// parents are created.
    async fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()>;

    /// Like [`write`](Self::write) but consumes `reader` in bounded chunks.
    /// Returns the number of bytes written.
    async fn write_stream(
        &self,
        path: &Path,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> StorageResult<u64>;

    /// Reads the whole content of `path`.
    async fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Lists paths whose last component matches the glob in `pattern`'s last
    /// component. Non-recursive; empty when nothing matches.
    async fn list(&self, pattern: &Path) -> StorageResult<Vec<PathBuf>>;

    /// Removes `path`, or everything under it when it is a prefix. Returns
    /// `false` when it was already absent and `missing_ok` is set.
    async fn delete(&self, path: &Path, missing_ok: bool) -> StorageResult<bool>;

    async fn exists(&self, path: &Path) -> StorageResult<bool>;

    /// Size in bytes of the file at `path`.
    async fn size(&self, path: &Path) -> StorageResult<u64>;

    /// Makes sure a grouping exists. Never fails because it already does.
    async fn ensure_dir(&self, path: &Path) -> StorageResult<()>;

    /// Creates an empty marker at `path` unless something is already there.
    async fn touch(&self, path: &Path) -> StorageResult<()>;
}

/// Resolves `path` against `root` and checks it stays inside.
///
/// Relative paths are taken relative to `root`. `.` components are dropped and
/// `..` components are refused outright, so nothing here depends on what
/// exists on disk.
pub fn contain(root: &Path, path: &Path) -> StorageResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                return Err(StorageError::invalid_path(
                    path,
                    "parent directory references are not allowed",
                ));
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }

    if !normalized.starts_with(root) {
        return Err(StorageError::invalid_path(path, "outside the storage root"));
    }
    Ok(normalized)
}

/// Lexically normalises a root directory: made absolute, `.` dropped, `..`
/// applied.
pub fn normalize_root(root: &Path) -> StorageResult<PathBuf> {
    let absolute = std::path::absolute(root)
        .map_err(|e| StorageError::invalid_path(root, format!("cannot make absolute: {e}")))?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Whether a string contains glob metacharacters.
pub fn has_wildcards(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Shell-style match of a single path component.
///
/// Supports `*`, `?`, and bracket classes (`[abc]`, `[a-z]`, `[!x]`). As in a
/// shell, a leading `.` must be matched explicitly.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    if name.starts_with('.') && !pattern.starts_with('.') {
        return false;
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    match_from(&pattern, &name)
}

fn match_from(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0, 0);
    // Position to resume from after the most recent `*`.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        let step = match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
                continue;
            }
            Some('?') => Some(1),
            Some('[') => match match_class(&pattern[p..], name[n]) {
                Some((true, len)) => Some(len),
                Some((false, _)) => None,
                // Unterminated class: treat '[' literally.
                None => (name[n] == '[').then_some(1),
            },
            Some(c) => (*c == name[n]).then_some(1),
            None => None,
        };

        match step {
            Some(len) => {
                p += len;
                n += 1;
            }
            None => match backtrack {
                Some((star_p, star_n)) => {
                    backtrack = Some((star_p, star_n + 1));
                    p = star_p + 1;
                    n = star_n + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Matches `c` against the class starting at `class[0] == '['`. Returns
/// whether it matched and the class length, or `None` if unterminated.
fn match_class(class: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 1;
    let negated = matches!(class.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }
    let mut matched = false;
    let mut first = true;
    while i < class.len() {
        let current = class[i];
        if current == ']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;
        if class.get(i + 1) == Some(&'-') && class.get(i + 2).is_some_and(|end| *end != ']') {
            let end = class[i + 2];
            if current <= c && c <= end {
                matched = true;
            }
            i += 3;
        } else {
            if current == c {
                matched = true;
            }
            i += 1;
        }
    }
    None
}
