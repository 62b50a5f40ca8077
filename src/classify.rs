//! Classification of paths into files, directories, or neither.

use crate::error::{TreeError, TreeResult};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// What a path denotes on disk right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// An existing regular file (symlinks are followed).
    File,
    /// An existing directory (symlinks are followed).
    Dir,
    /// Missing, a broken link, or something that is neither.
    Neither,
}

impl PathKind {
    /// Classifies `path`, following symbolic links.
    ///
    /// Any metadata failure classifies as [`PathKind::Neither`].
    pub fn classify(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Self::Dir,
            Ok(meta) if meta.is_file() => Self::File,
            _ => Self::Neither,
        }
    }

    /// Converts to the entry kind it satisfies, if any.
    pub fn entry_kind(self) -> Option<EntryKind> {
        match self {
            Self::File => Some(EntryKind::File),
            Self::Dir => Some(EntryKind::Dir),
            Self::Neither => None,
        }
    }
}

/// The kind of entry a traversal is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    /// Short lowercase label used in output.
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
        }
    }
}

/// Reads the last-modification time of `path`, following symbolic links.
pub fn modified_time(path: &Path) -> TreeResult<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| TreeError::filesystem(path, e))
}

/// Determines the kind of a walked entry without re-reading metadata for plain entries.
pub(crate) fn walked_entry_kind(entry: &walkdir::DirEntry) -> Option<EntryKind> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        Some(EntryKind::Dir)
    } else if file_type.is_file() {
        Some(EntryKind::File)
    } else if file_type.is_symlink() {
        PathKind::classify(entry.path()).entry_kind()
    } else {
        None
    }
}
