//! Deterministic ordering of entries by modification time.

use crate::classify::modified_time;
use crate::error::TreeResult;
use std::path::PathBuf;
use std::time::SystemTime;

/// Entries sorted ascending by `(modification time, path)`.
///
/// All timestamps are read when the ordering is built; iteration itself does no I/O.
#[derive(Debug)]
pub struct OrderedEntries {
    entries: std::vec::IntoIter<(SystemTime, PathBuf)>,
}

impl Iterator for OrderedEntries {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(_, path)| path)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for OrderedEntries {}

/// Drains `entries`, reads each one's modification time and orders them.
///
/// Ties on the timestamp are broken by comparing the path strings, so the same tree
/// always yields the same order. The first upstream error or failed timestamp read aborts the whole
/// ordering; no partial result is returned.
pub fn order_by_mtime<I>(entries: I) -> TreeResult<OrderedEntries>
where
    I: IntoIterator<Item = TreeResult<PathBuf>>,
{
    let mut stamped = entries
        .into_iter()
        .map(|entry| {
            let path = entry?;
            Ok((modified_time(&path)?, path))
        })
        .collect::<TreeResult<Vec<_>>>()?;
    stamped.sort_by(|(a_time, a_path), (b_time, b_path)| {
        a_time
            .cmp(b_time)
            .then_with(|| a_path.as_os_str().cmp(b_path.as_os_str()))
    });

    Ok(OrderedEntries {
        entries: stamped.into_iter(),
    })
}
