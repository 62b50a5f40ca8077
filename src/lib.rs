//! treemirror - walk, filter and mirror directory trees
//!
//! This library provides lazy traversal of a root path, predicate filters over that
//! traversal (base name, regex, glob, modification time), deterministic ordering by
//! modification time, and relative mapping of entries from a source root into a
//! destination root with directory-safe copying. The `grep` module extracts regex
//! matches from file contents. The `cli` module builds search, copy, delete, count and
//! grep commands on top of those pieces.

pub mod classify;
pub mod cli;
pub mod config;
mod copy;
pub mod error;
pub mod filter;
pub mod grep;
pub mod mapping;
pub mod order;
pub mod output;
pub mod report;
pub mod timestamp;
pub mod traversal;

pub use classify::{EntryKind, PathKind};
pub use config::{ConfigError, Settings};
pub use error::{TreeError, TreeResult};
pub use mapping::RelativeMapping;
pub use order::{OrderedEntries, order_by_mtime};
pub use report::{CommandReport, CountReport, GrepReport};
pub use traversal::{Traversal, traverse};

pub use cli::{Cli, Command, Outcome, run_cli};
