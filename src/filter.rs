//! Predicate filters over a traversal.
//!
//! Each filter starts a [`traverse`] of the root and keeps only the entries that pass
//! its test. Filters stay lazy: an entry is tested when it is pulled. Traversal errors
//! and metadata failures on individual entries are passed through to the caller as
//! `Err` items, never dropped.

use crate::classify::{EntryKind, modified_time};
use crate::error::TreeResult;
use crate::traversal::traverse;
use glob::{MatchOptions, Pattern};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Runs `keep` against every traversal entry, forwarding errors from either side.
fn filter_entries<F>(
    root: &Path,
    kind: EntryKind,
    recursive: bool,
    mut keep: F,
) -> TreeResult<impl Iterator<Item = TreeResult<PathBuf>>>
where
    F: FnMut(&Path) -> TreeResult<bool>,
{
    let walk = traverse(root, kind, recursive)?;
    Ok(walk.filter_map(move |entry| match entry {
        Ok(path) => match keep(&path) {
            Ok(true) => Some(Ok(path)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        },
        Err(e) => Some(Err(e)),
    }))
}

/// Keeps entries whose final path component equals `name`, ignoring case.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use treemirror::{EntryKind, filter};
///
/// let caches = filter::by_base_name(Path::new("/src"), "__pycache__", EntryKind::Dir, true)?;
/// for dir in caches {
///     println!("{}", dir?.display());
/// }
/// # Ok::<(), treemirror::TreeError>(())
/// ```
pub fn by_base_name<'a>(
    root: &'a Path,
    name: &'a str,
    kind: EntryKind,
    recursive: bool,
) -> TreeResult<impl Iterator<Item = TreeResult<PathBuf>> + 'a> {
    let wanted = name.to_uppercase();
    filter_entries(root, kind, recursive, move |path| {
        Ok(path
            .file_name()
            .is_some_and(|base| base.to_string_lossy().to_uppercase() == wanted))
    })
}

/// Keeps entries whose full path matches `pattern` starting at the first character.
///
/// The match only has to begin at the start of the path; it need not cover the whole
/// string unless the pattern ends with `$`. Case sensitivity is whatever the pattern
/// was compiled with.
pub fn by_regex<'a>(
    root: &'a Path,
    pattern: &'a Regex,
    kind: EntryKind,
    recursive: bool,
) -> TreeResult<impl Iterator<Item = TreeResult<PathBuf>> + 'a> {
    filter_entries(root, kind, recursive, move |path| {
        Ok(matches_at_start(pattern, &path.to_string_lossy()))
    })
}

/// Keeps entries modified strictly after `min_modified`.
pub fn by_modified_time<'a>(
    root: &'a Path,
    min_modified: SystemTime,
    kind: EntryKind,
    recursive: bool,
) -> TreeResult<impl Iterator<Item = TreeResult<PathBuf>> + 'a> {
    filter_entries(root, kind, recursive, move |path| {
        Ok(modified_time(path)? > min_modified)
    })
}

/// Keeps entries whose file name matches the glob `pattern` under `options`.
pub fn by_glob<'a>(
    root: &'a Path,
    pattern: &'a Pattern,
    options: MatchOptions,
    kind: EntryKind,
    recursive: bool,
) -> TreeResult<impl Iterator<Item = TreeResult<PathBuf>> + 'a> {
    filter_entries(root, kind, recursive, move |path| {
        Ok(path
            .file_name()
            .is_some_and(|base| pattern.matches_with(&base.to_string_lossy(), options)))
    })
}

/// Leftmost-first search means a match starting at 0 is found whenever one exists.
fn matches_at_start(pattern: &Regex, haystack: &str) -> bool {
    pattern.find(haystack).is_some_and(|m| m.start() == 0)
}
