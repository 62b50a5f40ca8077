//! Error types shared by traversal, filtering, ordering and mirroring.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while walking, filtering or copying a tree.
#[derive(Debug)]
pub enum TreeError {
    /// The path is neither an existing file nor an existing directory.
    InvalidPath { path: PathBuf },
    /// An OS-level failure during enumeration, metadata reads, copy or directory creation.
    Filesystem { path: PathBuf, source: io::Error },
    /// A directory copy target is already present.
    DestinationExists { path: PathBuf },
}

impl TreeError {
    pub(crate) fn invalid_path(path: &Path) -> Self {
        Self::InvalidPath {
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn filesystem(path: &Path, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidPath { path }
            | Self::Filesystem { path, .. }
            | Self::DestinationExists { path } => path,
        }
    }
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath { path } => {
                write!(f, "{} is neither a file nor a directory", path.display())
            }
            Self::Filesystem { path, source } => {
                write!(f, "Filesystem error at {}: {}", path.display(), source)
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filesystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<walkdir::Error> for TreeError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        Self::Filesystem {
            path,
            source: io::Error::from(err),
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
