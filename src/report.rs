//! Results of batch commands.

use crate::classify::{EntryKind, PathKind};
use crate::error::{TreeError, TreeResult};
use crate::traversal::traverse;
use std::fs;
use std::path::{Path, PathBuf};

/// Tally of a batch command run over many entries.
///
/// Failures on individual entries are recorded here and the batch keeps going.
#[derive(Debug, Default)]
pub struct CommandReport {
    /// Entries the selection produced.
    pub matched: usize,
    /// Entries the command handled successfully.
    pub succeeded: usize,
    /// Entries the command left alone, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Entries that failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

impl CommandReport {
    pub(crate) fn record_failure(&mut self, err: &TreeError) {
        self.failed.push((err.path().to_path_buf(), err.to_string()));
    }

    /// Returns true if nothing failed and nothing was skipped.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Outcome of a grep run: the per-file tally plus what was written.
#[derive(Debug)]
pub struct GrepReport {
    /// Files scanned and files that could not be read.
    pub batch: CommandReport,
    /// Rows extracted across all files.
    pub rows: usize,
    /// The `grep.txt` or `grep.csv` file that was written.
    pub output: PathBuf,
}

/// Number of files, their total size and number of directories under a root.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountReport {
    pub files: u64,
    pub bytes: u64,
    pub dirs: u64,
}

impl CountReport {
    /// Counts everything beneath `root` at any depth.
    ///
    /// A file root counts as one file and no directories. The first unreadable
    /// entry aborts the count.
    pub fn collect(root: &Path) -> TreeResult<Self> {
        let mut report = Self::default();
        match PathKind::classify(root) {
            PathKind::File => {
                report.files = 1;
                report.bytes = file_size(root)?;
            }
            PathKind::Dir => {
                for entry in traverse(root, EntryKind::File, true)? {
                    let path = entry?;
                    report.files += 1;
                    report.bytes += file_size(&path)?;
                }
                for entry in traverse(root, EntryKind::Dir, true)? {
                    entry?;
                    report.dirs += 1;
                }
            }
            PathKind::Neither => return Err(TreeError::invalid_path(root)),
        }
        Ok(report)
    }
}

fn file_size(path: &Path) -> TreeResult<u64> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| TreeError::filesystem(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_count_tree() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("one.txt"), "12345").unwrap();
        fs::write(root.join("a/b/two.txt"), "123").unwrap();

        let report = CountReport::collect(root).unwrap();
        assert_eq!(
            report,
            CountReport {
                files: 2,
                bytes: 8,
                dirs: 2
            }
        );
    }

    #[test]
    fn test_count_single_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("f.bin");
        fs::write(&file, [0u8; 16]).unwrap();

        let report = CountReport::collect(&file).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.bytes, 16);
        assert_eq!(report.dirs, 0);
    }

    #[test]
    fn test_report_success_flags() {
        let mut report = CommandReport::default();
        assert!(report.is_complete_success());

        report.record_failure(&TreeError::DestinationExists {
            path: PathBuf::from("/out/x"),
        });
        assert!(!report.is_complete_success());
        assert_eq!(report.failed[0].0, PathBuf::from("/out/x"));
    }
}
