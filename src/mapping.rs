//! Mirroring of entries from a source root into a destination root.
//!
//! A [`RelativeMapping`] is computed for one entry right before it is copied. It knows
//! where the entry sits relative to its source root and where the mirrored copy goes
//! under the destination root, so intermediate directories of the source tree are
//! reproduced in the output.
//!
//! The computed paths depend only on the three inputs. Creating parent directories can
//! be repeated safely; copying a directory cannot, because a directory copy never
//! merges into an existing destination.

use crate::classify::PathKind;
use crate::copy::{copy_file_with_metadata, copy_tree};
use crate::error::{TreeError, TreeResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a mirrored entry lands.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Destination {
    root: PathBuf,
    entry: PathBuf,
    parent: PathBuf,
}

/// Source and destination locations of a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeMapping {
    source_root: PathBuf,
    source_entry: PathBuf,
    relative_path: PathBuf,
    relative_parent: PathBuf,
    destination: Option<Destination>,
}

impl RelativeMapping {
    /// Computes the mapping of `source_entry` under `source_root`.
    ///
    /// When the entry differs from the root, the relative path is the entry with the
    /// root prefix removed and the relative parent is its directory part (empty for
    /// direct children).
    ///
    /// When the entry *is* the root (a traversal over a single file), the relative
    /// path is the name of the entry's parent directory and the relative parent is
    /// empty, meaning no intermediate directories are needed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidPath`] if `source_entry` is not beneath
    /// `source_root`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use treemirror::RelativeMapping;
    ///
    /// let mapping = RelativeMapping::new(
    ///     Path::new("/root"),
    ///     Path::new("/root/a/b.txt"),
    ///     Some(Path::new("/out")),
    /// )?;
    /// assert_eq!(mapping.destination_entry(), Some(Path::new("/out/a/b.txt")));
    /// assert_eq!(mapping.destination_parent(), Some(Path::new("/out/a")));
    /// # Ok::<(), treemirror::TreeError>(())
    /// ```
    pub fn new(
        source_root: &Path,
        source_entry: &Path,
        destination_root: Option<&Path>,
    ) -> TreeResult<Self> {
        let (relative_path, relative_parent) = if source_root != source_entry {
            let relative = source_entry
                .strip_prefix(source_root)
                .map_err(|_| TreeError::invalid_path(source_entry))?
                .to_path_buf();
            let parent = relative.parent().map(Path::to_path_buf).unwrap_or_default();
            (relative, parent)
        } else {
            let parent_name = source_entry
                .parent()
                .and_then(Path::file_name)
                .map(PathBuf::from)
                .unwrap_or_default();
            (parent_name, PathBuf::new())
        };

        let destination = destination_root.map(|root| Destination {
            root: root.to_path_buf(),
            entry: join_relative(root, &relative_path),
            parent: join_relative(root, &relative_parent),
        });

        Ok(Self {
            source_root: source_root.to_path_buf(),
            source_entry: source_entry.to_path_buf(),
            relative_path,
            relative_parent,
            destination,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn source_entry(&self) -> &Path {
        &self.source_entry
    }

    /// The entry's path relative to the source root.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// The relative path of the entry's parent; empty when no intermediate
    /// directories are required.
    pub fn relative_parent(&self) -> &Path {
        &self.relative_parent
    }

    pub fn destination_root(&self) -> Option<&Path> {
        self.destination.as_ref().map(|d| d.root.as_path())
    }

    /// Where the entry is copied to.
    pub fn destination_entry(&self) -> Option<&Path> {
        self.destination.as_ref().map(|d| d.entry.as_path())
    }

    /// The directory that has to exist before the entry can be copied.
    pub fn destination_parent(&self) -> Option<&Path> {
        self.destination.as_ref().map(|d| d.parent.as_path())
    }

    fn require_destination(&self) -> TreeResult<&Destination> {
        self.destination
            .as_ref()
            .ok_or_else(|| TreeError::invalid_path(&self.source_entry))
    }

    /// Creates the destination parent chain.
    ///
    /// Does nothing when the relative parent is empty. A directory that already exists
    /// is not an error; anything else in the way is.
    pub fn ensure_parent_dirs(&self) -> TreeResult<()> {
        let destination = self.require_destination()?;
        if self.relative_parent.as_os_str().is_empty() {
            return Ok(());
        }
        if destination.parent.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&destination.parent)
            .map_err(|e| TreeError::filesystem(&destination.parent, e))?;
        debug!(path = %destination.parent.display(), "created directory");
        Ok(())
    }

    /// Copies the source entry to the destination entry.
    ///
    /// Files are copied with their permissions and timestamps; a file whose
    /// destination is an existing directory lands inside it. Directories are copied
    /// recursively and fail with [`TreeError::DestinationExists`] if the destination
    /// is already there. Anything that is neither fails with
    /// [`TreeError::InvalidPath`].
    pub fn copy(&self) -> TreeResult<()> {
        let destination = self.require_destination()?;
        match PathKind::classify(&self.source_entry) {
            PathKind::File => {
                copy_file_with_metadata(&self.source_entry, &destination.entry).map(|_| ())
            }
            PathKind::Dir => copy_tree(&self.source_entry, &destination.entry),
            PathKind::Neither => Err(TreeError::invalid_path(&self.source_entry)),
        }
    }

    /// Creates the parent directories, then copies.
    ///
    /// Directories created before a failed copy are left in place.
    pub fn copy_with_dirs(&self) -> TreeResult<()> {
        self.ensure_parent_dirs()?;
        self.copy()
    }
}

impl fmt::Display for RelativeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source:")?;
        writeln!(f, "  root:            {}", self.source_root.display())?;
        writeln!(f, "  entry:           {}", self.source_entry.display())?;
        writeln!(f, "  relative path:   {}", self.relative_path.display())?;
        writeln!(f, "  relative parent: {}", self.relative_parent.display())?;
        match &self.destination {
            Some(destination) => {
                writeln!(f, "Destination:")?;
                writeln!(f, "  root:            {}", destination.root.display())?;
                writeln!(f, "  entry:           {}", destination.entry.display())?;
                write!(f, "  parent:          {}", destination.parent.display())
            }
            None => write!(f, "Destination: (none)"),
        }
    }
}

/// Joins without introducing a trailing separator for an empty relative part.
fn join_relative(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}
