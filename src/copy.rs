//! File and directory-tree copy primitives used by [`crate::mapping`].

use crate::classify::{EntryKind, walked_entry_kind};
use crate::error::{TreeError, TreeResult};
use filetime::{FileTime, set_file_times};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Copies a regular file and carries over its permissions and timestamps.
///
/// When `dst` is an existing directory the file is copied into it under its own name.
/// Returns the path that was written.
pub(crate) fn copy_file_with_metadata(src: &Path, dst: &Path) -> TreeResult<PathBuf> {
    let target = if dst.is_dir() {
        match src.file_name() {
            Some(name) => dst.join(name),
            None => return Err(TreeError::invalid_path(src)),
        }
    } else {
        dst.to_path_buf()
    };

    // fs::copy also copies the permission bits.
    fs::copy(src, &target).map_err(|e| TreeError::filesystem(src, e))?;
    apply_times(src, &target)?;
    debug!(from = %src.display(), to = %target.display(), "copied file");
    Ok(target)
}

/// Copies the directory `src` and everything beneath it to `dst`.
///
/// `dst` must not exist yet; its missing ancestors are created. Symbolic links inside
/// the tree are followed and their targets copied. Directory timestamps are applied
/// after their contents are written.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> TreeResult<()> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(TreeError::DestinationExists {
            path: dst.to_path_buf(),
        });
    }
    if lies_within(dst, src) {
        return Err(TreeError::filesystem(
            dst,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination is inside the source tree",
            ),
        ));
    }

    fs::create_dir_all(dst).map_err(|e| TreeError::filesystem(dst, e))?;
    let mut copied_dirs = vec![(src.to_path_buf(), dst.to_path_buf())];

    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| TreeError::invalid_path(entry.path()))?;
        let target = dst.join(relative);

        match walked_entry_kind(&entry) {
            Some(EntryKind::Dir) => {
                fs::create_dir(&target).map_err(|e| TreeError::filesystem(&target, e))?;
                copied_dirs.push((entry.into_path(), target));
            }
            Some(EntryKind::File) => {
                copy_file_with_metadata(entry.path(), &target)?;
            }
            None => return Err(TreeError::invalid_path(entry.path())),
        }
    }

    // Deepest first so writing children does not bump a stamped parent.
    for (dir_src, dir_dst) in copied_dirs.iter().rev() {
        apply_times(dir_src, dir_dst)?;
    }
    debug!(from = %src.display(), to = %dst.display(), "copied tree");
    Ok(())
}

/// Returns true if `inner` is `outer` or lies beneath it.
///
/// Both paths are resolved through their longest existing ancestor, so symlinked,
/// relative and not-yet-created paths compare by where they would land on disk.
pub(crate) fn lies_within(inner: &Path, outer: &Path) -> bool {
    resolved(inner).starts_with(resolved(outer))
}

fn resolved(path: &Path) -> PathBuf {
    if let Ok(real) = fs::canonicalize(path) {
        return real;
    }
    let base = match path.parent() {
        None => return std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
        Some(parent) if parent.as_os_str().is_empty() => std::env::current_dir()
            .and_then(fs::canonicalize)
            .unwrap_or_default(),
        Some(parent) => resolved(parent),
    };
    // Missing components cannot be links, so `..` is applied lexically.
    match path.components().next_back() {
        Some(Component::ParentDir) => base.parent().map(Path::to_path_buf).unwrap_or(base),
        Some(Component::Normal(name)) => base.join(name),
        _ => base,
    }
}

fn apply_times(src: &Path, dst: &Path) -> TreeResult<()> {
    let stat_src = fs::metadata(src).map_err(|e| TreeError::filesystem(src, e))?;
    let access = FileTime::from_last_access_time(&stat_src);
    let modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(dst, access, modify).map_err(|e| TreeError::filesystem(dst, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::set_file_mtime;
    use tempfile::TempDir;

    #[test]
    fn test_copy_file_preserves_mtime() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("in.txt");
        let dst = temp_dir.path().join("out.txt");
        fs::write(&src, "payload").unwrap();
        set_file_mtime(&src, FileTime::from_unix_time(1_500_000_000, 0)).unwrap();

        let written = copy_file_with_metadata(&src, &dst).unwrap();

        assert_eq!(written, dst);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "payload");
        let meta = fs::metadata(&dst).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&meta),
            FileTime::from_unix_time(1_500_000_000, 0)
        );
    }

    #[test]
    fn test_copy_file_into_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("in.txt");
        let dst_dir = temp_dir.path().join("box");
        fs::write(&src, "payload").unwrap();
        fs::create_dir(&dst_dir).unwrap();

        let written = copy_file_with_metadata(&src, &dst_dir).unwrap();
        assert_eq!(written, dst_dir.join("in.txt"));
        assert!(written.is_file());
    }

    #[test]
    fn test_copy_tree_mirrors_structure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.txt"), "1").unwrap();
        fs::write(src.join("a/b/leaf.txt"), "2").unwrap();

        let dst = temp_dir.path().join("out/copy");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "1");
        assert_eq!(fs::read_to_string(dst.join("a/b/leaf.txt")).unwrap(), "2");
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_copy_tree_refuses_existing_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("new.txt"), "new").unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("keep.txt"), "keep").unwrap();

        let result = copy_tree(&src, &dst);

        assert!(matches!(result, Err(TreeError::DestinationExists { .. })));
        assert!(!dst.join("new.txt").exists());
        assert_eq!(fs::read_to_string(dst.join("keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn test_copy_tree_rejects_destination_inside_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let result = copy_tree(&src, &src.join("nested"));
        assert!(matches!(result, Err(TreeError::Filesystem { .. })));
        assert!(!src.join("nested").exists());
    }

    #[test]
    fn test_lies_within_resolves_missing_and_dotted_paths() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("a")).unwrap();

        assert!(lies_within(&src, &src));
        assert!(lies_within(&src.join("not/yet/made"), &src));
        assert!(lies_within(&src.join("a/../out"), &src));
        assert!(!lies_within(&temp_dir.path().join("src2"), &src));
        assert!(lies_within(&src.join("missing/../out"), &src));
        assert!(!lies_within(&src.join("../elsewhere"), &src));
        assert!(!lies_within(&src.join("missing/../../elsewhere"), &src));
    }

    #[cfg(unix)]
    #[test]
    fn test_lies_within_follows_symlinked_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let alias = temp_dir.path().join("alias");
        std::os::unix::fs::symlink(&src, &alias).expect("Failed to create symlink");

        assert!(lies_within(&alias.join("out"), &src));
    }
}
