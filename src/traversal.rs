//! Lazy traversal of a root path.
//!
//! A traversal walks a directory root and yields entries of one kind, either at any
//! depth or only directly inside the root. A file root is a trivial traversal that
//! yields the file itself, so callers can handle "one file" and "a whole tree" with the
//! same loop.
//!
//! Entries are produced on demand in the order the directory walk enumerates them.
//! Dropping the iterator stops the walk.

use crate::classify::{EntryKind, PathKind, walked_entry_kind};
use crate::error::{TreeError, TreeResult};
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Single-pass iterator over the entries beneath a root.
///
/// Enumeration failures are yielded as `Err` items; the walk continues afterwards
/// if the caller keeps pulling.
pub struct Traversal {
    inner: TraversalInner,
}

enum TraversalInner {
    Single(Option<PathBuf>),
    Walk {
        walker: walkdir::IntoIter,
        kind: EntryKind,
    },
}

impl Iterator for Traversal {
    type Item = TreeResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            TraversalInner::Single(slot) => slot.take().map(Ok),
            TraversalInner::Walk { walker, kind } => loop {
                let entry = match walker.next()? {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(TreeError::from(e))),
                };
                if walked_entry_kind(&entry) == Some(*kind) {
                    trace!(path = %entry.path().display(), "traversal entry");
                    return Some(Ok(entry.into_path()));
                }
            },
        }
    }
}

impl std::fmt::Debug for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            TraversalInner::Single(slot) => f.debug_tuple("Traversal::Single").field(slot).finish(),
            TraversalInner::Walk { kind, .. } => {
                f.debug_struct("Traversal::Walk").field("kind", kind).finish()
            }
        }
    }
}

/// Starts a traversal of `root`.
///
/// - `root` is a directory: yields entries of `kind` beneath it, the root itself
///   excluded. With `recursive` false only direct children are considered.
/// - `root` is a file: yields exactly `root`, whatever `kind` and `recursive` say.
/// - otherwise: fails with [`TreeError::InvalidPath`].
///
/// Symbolic links are classified by their target but never descended into. Yielded
/// paths are `root` joined with the entry's relative location, so they always start
/// with `root` exactly as given.
///
/// # Examples
///
/// ```no_run
/// use treemirror::{EntryKind, traverse};
///
/// for entry in traverse("/data/in", EntryKind::File, true)? {
///     println!("{}", entry?.display());
/// }
/// # Ok::<(), treemirror::TreeError>(())
/// ```
pub fn traverse(
    root: impl AsRef<Path>,
    kind: EntryKind,
    recursive: bool,
) -> TreeResult<Traversal> {
    let root = root.as_ref();
    let inner = match PathKind::classify(root) {
        PathKind::Dir => {
            let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
            if !recursive {
                walker = walker.max_depth(1);
            }
            TraversalInner::Walk {
                walker: walker.into_iter(),
                kind,
            }
        }
        PathKind::File => TraversalInner::Single(Some(root.to_path_buf())),
        PathKind::Neither => return Err(TreeError::invalid_path(root)),
    };
    Ok(Traversal { inner })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn collect(root: &Path, kind: EntryKind, recursive: bool) -> BTreeSet<PathBuf> {
        traverse(root, kind, recursive)
            .expect("traversal should start")
            .collect::<TreeResult<BTreeSet<_>>>()
            .expect("traversal should not fail")
    }

    fn nested_tree() -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("top.txt"), "t").unwrap();
        fs::create_dir_all(root.join("x/deep")).unwrap();
        fs::write(root.join("x/y.txt"), "y").unwrap();
        fs::write(root.join("x/deep/z.txt"), "z").unwrap();
        temp_dir
    }

    #[test]
    fn test_flat_directory_same_set_either_way() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        for name in ["a", "b", "c"] {
            fs::write(root.join(name), name).unwrap();
        }

        let expected: BTreeSet<_> = ["a", "b", "c"].iter().map(|n| root.join(n)).collect();
        assert_eq!(collect(root, EntryKind::File, true), expected);
        assert_eq!(collect(root, EntryKind::File, false), expected);
    }

    #[test]
    fn test_non_recursive_files_exclude_nested() {
        let temp_dir = nested_tree();
        let root = temp_dir.path();

        let shallow = collect(root, EntryKind::File, false);
        assert_eq!(shallow, BTreeSet::from([root.join("top.txt")]));

        let deep = collect(root, EntryKind::File, true);
        assert!(deep.contains(&root.join("x/y.txt")));
        assert!(deep.contains(&root.join("x/deep/z.txt")));
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_directories_exclude_root() {
        let temp_dir = nested_tree();
        let root = temp_dir.path();

        assert_eq!(
            collect(root, EntryKind::Dir, true),
            BTreeSet::from([root.join("x"), root.join("x/deep")])
        );
        assert_eq!(
            collect(root, EntryKind::Dir, false),
            BTreeSet::from([root.join("x")])
        );
    }

    #[test]
    fn test_file_root_yields_itself() {
        let temp_dir = nested_tree();
        let file = temp_dir.path().join("top.txt");

        for kind in [EntryKind::File, EntryKind::Dir] {
            for recursive in [true, false] {
                let entries: Vec<_> = traverse(&file, kind, recursive)
                    .unwrap()
                    .collect::<TreeResult<_>>()
                    .unwrap();
                assert_eq!(entries, vec![file.clone()]);
            }
        }
    }

    #[test]
    fn test_missing_root_is_invalid_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope");

        let result = traverse(&missing, EntryKind::File, true);
        assert!(matches!(result, Err(TreeError::InvalidPath { .. })));
    }

    #[test]
    fn test_traversal_is_lazy_and_single_pass() {
        let temp_dir = nested_tree();
        let mut walk = traverse(temp_dir.path(), EntryKind::File, true).unwrap();

        assert!(walk.next().is_some());
        let rest = walk.by_ref().count();
        assert_eq!(rest, 2);
        assert!(walk.next().is_none());
    }
}
