//! Command-line interface module for treemirror.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing (clap) and resolution against the loaded settings
//! - Building the entry selection for a root
//! - Search, copy, delete, count, mapping and grep orchestration
//!
//! Each subcommand pulls entries one at a time. A failure on one entry is reported
//! and counted, and the command moves on to the next entry.

use crate::classify::{EntryKind, PathKind, modified_time};
use crate::config::Settings;
use crate::copy::lies_within;
use crate::error::{TreeError, TreeResult};
use crate::filter;
use crate::grep::{self, GrepLayout};
use crate::mapping::RelativeMapping;
use crate::order::order_by_mtime;
use crate::output::OutputFormatter;
use crate::report::{CommandReport, CountReport, GrepReport};
use crate::timestamp::parse_timestamp;
use crate::traversal::traverse;
use chrono::{DateTime, Local};
use clap::{ArgAction, Args, Parser, Subcommand};
use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Base name removed by `delete --pycache`.
const PYCACHE_DIR: &str = "__pycache__";

/// Walk, filter and mirror directory trees.
#[derive(Debug, Parser)]
#[command(name = "treemirror", version, about)]
pub struct Cli {
    /// Settings file to use instead of the default lookup.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// How entries are picked. At most one selector may be given.
#[derive(Debug, Clone, Default, Args)]
#[group(multiple = false)]
pub struct Selector {
    /// Match the final path component, ignoring case.
    #[arg(long)]
    pub name: Option<String>,

    /// Match the full path from its first character.
    #[arg(long)]
    pub regex: Option<String>,

    /// Match the file name against a glob pattern.
    #[arg(long)]
    pub glob: Option<String>,

    /// Keep entries modified after this local time.
    #[arg(long, value_name = "TIMESTAMP")]
    pub since: Option<String>,
}

impl Selector {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.regex.is_none() && self.glob.is_none() && self.since.is_none()
    }
}

/// Traversal shape shared by the selecting commands.
#[derive(Debug, Clone, Args)]
pub struct WalkOptions {
    /// Kind of entries to produce.
    #[arg(long, value_enum, default_value_t = EntryKind::File)]
    pub kind: EntryKind,

    /// Only look at direct children of the root.
    #[arg(long)]
    pub no_recursive: bool,

    /// Emit entries oldest first instead of in walk order.
    #[arg(long)]
    pub sort_mtime: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            kind: EntryKind::File,
            no_recursive: false,
            sort_mtime: false,
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the entries under a root that match a selector.
    Search {
        root: PathBuf,
        #[command(flatten)]
        selector: Selector,
        #[command(flatten)]
        walk: WalkOptions,
        /// Print one JSON object per entry.
        #[arg(long)]
        json: bool,
    },
    /// Copy matching entries into a destination, mirroring their directories.
    Copy {
        root: PathBuf,
        dest: PathBuf,
        #[command(flatten)]
        selector: Selector,
        #[command(flatten)]
        walk: WalkOptions,
        /// Show what would be copied without copying.
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete matching files or directories.
    Delete {
        root: PathBuf,
        /// Delete every `__pycache__` directory.
        #[arg(long, conflicts_with_all = ["name", "regex", "glob", "since"])]
        pycache: bool,
        #[command(flatten)]
        selector: Selector,
        #[command(flatten)]
        walk: WalkOptions,
        /// Show what would be deleted without deleting.
        #[arg(long)]
        dry_run: bool,
    },
    /// Count files, bytes and directories under a root.
    Count { root: PathBuf },
    /// Show how an entry maps from a source root into a destination.
    Mapping {
        root: PathBuf,
        entry: PathBuf,
        dest: Option<PathBuf>,
    },
    /// Extract regex matches from file contents into grep.txt or grep.csv.
    Grep {
        root: PathBuf,
        out_dir: PathBuf,
        /// Regular expression run over each file's contents.
        #[arg(long)]
        pattern: String,
        #[command(flatten)]
        selector: Selector,
        /// Only look at direct children of the root.
        #[arg(long)]
        no_recursive: bool,
        /// Scan files oldest first instead of in walk order.
        #[arg(long)]
        sort_mtime: bool,
        /// Column names for the pattern's capture groups.
        #[arg(long, num_args = 1..)]
        columns: Vec<String>,
    },
}

/// What a command produced.
#[derive(Debug)]
pub enum Outcome {
    Batch(CommandReport),
    Count(CountReport),
    Mapping(RelativeMapping),
    Grep(GrepReport),
}

/// A compiled selector, ready to filter a traversal.
enum Selection {
    All,
    Name(String),
    Regex(Regex),
    Glob(Pattern, MatchOptions),
    Since(SystemTime),
}

type EntryStream<'a> = Box<dyn Iterator<Item = TreeResult<PathBuf>> + 'a>;

impl Selection {
    fn compile(selector: &Selector, settings: &Settings) -> Result<Self, String> {
        let case_insensitive = settings.search.case_insensitive;
        if let Some(name) = &selector.name {
            return Ok(Self::Name(name.clone()));
        }
        if let Some(expr) = &selector.regex {
            let regex = RegexBuilder::new(expr)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| format!("Invalid regex pattern '{}': {}", expr, e))?;
            return Ok(Self::Regex(regex));
        }
        if let Some(expr) = &selector.glob {
            let pattern = Pattern::new(expr)
                .map_err(|e| format!("Invalid glob pattern '{}': {}", expr, e))?;
            let options = MatchOptions {
                case_sensitive: !case_insensitive,
                ..MatchOptions::new()
            };
            return Ok(Self::Glob(pattern, options));
        }
        if let Some(text) = &selector.since {
            let since = parse_timestamp(text, &settings.time.formats).map_err(|e| e.to_string())?;
            return Ok(Self::Since(since));
        }
        Ok(Self::All)
    }

    fn entries<'a>(
        &'a self,
        root: &'a Path,
        kind: EntryKind,
        recursive: bool,
    ) -> TreeResult<EntryStream<'a>> {
        let stream: EntryStream<'a> = match self {
            Self::All => Box::new(traverse(root, kind, recursive)?),
            Self::Name(name) => Box::new(filter::by_base_name(root, name, kind, recursive)?),
            Self::Regex(regex) => Box::new(filter::by_regex(root, regex, kind, recursive)?),
            Self::Glob(pattern, options) => Box::new(filter::by_glob(
                root, pattern, *options, kind, recursive,
            )?),
            Self::Since(since) => {
                Box::new(filter::by_modified_time(root, *since, kind, recursive)?)
            }
        };
        Ok(stream)
    }
}

/// Selects entries under `root` and applies the requested ordering.
fn select<'a>(
    selection: &'a Selection,
    root: &'a Path,
    walk: &WalkOptions,
    settings: &Settings,
) -> Result<EntryStream<'a>, String> {
    let recursive = settings.search.recursive && !walk.no_recursive;
    let entries = selection
        .entries(root, walk.kind, recursive)
        .map_err(|e| e.to_string())?;
    if walk.sort_mtime {
        let ordered = order_by_mtime(entries).map_err(|e| e.to_string())?;
        Ok(Box::new(ordered.map(Ok)))
    } else {
        Ok(entries)
    }
}

/// Runs a parsed command line.
///
/// Settings are loaded from `--config` or the default lookup. Errors that stop the
/// command before any entry is handled are returned as `Err`; failures on single
/// entries are collected in the returned report.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use treemirror::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["treemirror", "count", "/data"]);
/// match run_cli(cli) {
///     Ok(outcome) => println!("{:?}", outcome),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<Outcome, String> {
    let settings = Settings::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    OutputFormatter::set_color(settings.output.color && !cli.no_color);
    run_command(cli.command, &settings)
}

/// Runs one command with already-loaded settings.
pub fn run_command(command: Command, settings: &Settings) -> Result<Outcome, String> {
    match command {
        Command::Search {
            root,
            selector,
            walk,
            json,
        } => search(&root, &selector, &walk, json, settings).map(Outcome::Batch),
        Command::Copy {
            root,
            dest,
            selector,
            walk,
            dry_run,
        } => copy_entries(&root, &dest, &selector, &walk, dry_run, settings).map(Outcome::Batch),
        Command::Delete {
            root,
            pycache,
            selector,
            walk,
            dry_run,
        } => {
            let (selector, walk) = if pycache {
                let selector = Selector {
                    name: Some(PYCACHE_DIR.to_string()),
                    ..Selector::default()
                };
                let walk = WalkOptions {
                    kind: EntryKind::Dir,
                    ..walk
                };
                (selector, walk)
            } else {
                (selector, walk)
            };
            delete_entries(&root, &selector, &walk, dry_run, settings).map(Outcome::Batch)
        }
        Command::Count { root } => {
            let report = CountReport::collect(&root).map_err(|e| e.to_string())?;
            OutputFormatter::count_table(&report);
            Ok(Outcome::Count(report))
        }
        Command::Mapping { root, entry, dest } => {
            let mapping =
                RelativeMapping::new(&root, &entry, dest.as_deref()).map_err(|e| e.to_string())?;
            OutputFormatter::plain(&mapping.to_string());
            Ok(Outcome::Mapping(mapping))
        }
        Command::Grep {
            root,
            out_dir,
            pattern,
            selector,
            no_recursive,
            sort_mtime,
            columns,
        } => {
            let walk = WalkOptions {
                kind: EntryKind::File,
                no_recursive,
                sort_mtime,
            };
            grep_files(&root, &out_dir, &pattern, &selector, &walk, &columns, settings)
                .map(Outcome::Grep)
        }
    }
}

/// Prints every selected entry, as plain paths or JSON lines.
fn search(
    root: &Path,
    selector: &Selector,
    walk: &WalkOptions,
    json: bool,
    settings: &Settings,
) -> Result<CommandReport, String> {
    let selection = Selection::compile(selector, settings)?;
    let mut report = CommandReport::default();

    for entry in select(&selection, root, walk, settings)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                report.record_failure(&e);
                continue;
            }
        };
        report.matched += 1;

        if json {
            match json_line(&path) {
                Ok(line) => OutputFormatter::plain(&line),
                Err(e) => {
                    OutputFormatter::error(&e.to_string());
                    report.record_failure(&e);
                    continue;
                }
            }
        } else {
            OutputFormatter::plain(&path.display().to_string());
        }
        report.succeeded += 1;
    }

    info!(matched = report.matched, failed = report.failed.len(), "search finished");
    Ok(report)
}

fn json_line(path: &Path) -> TreeResult<String> {
    let kind = PathKind::classify(path)
        .entry_kind()
        .ok_or_else(|| TreeError::InvalidPath {
            path: path.to_path_buf(),
        })?;
    let modified: DateTime<Local> = modified_time(path)?.into();
    Ok(json!({
        "path": path.to_string_lossy(),
        "kind": kind,
        "modified": modified.to_rfc3339(),
    })
    .to_string())
}

/// Mirrors every selected entry from `root` into `dest`.
fn copy_entries(
    root: &Path,
    dest: &Path,
    selector: &Selector,
    walk: &WalkOptions,
    dry_run: bool,
    settings: &Settings,
) -> Result<CommandReport, String> {
    let selection = Selection::compile(selector, settings)?;
    if PathKind::classify(root) == PathKind::Dir && lies_within(dest, root) {
        return Err(format!(
            "Destination {} is inside the source root {}",
            dest.display(),
            root.display()
        ));
    }
    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Copying from {} to {}",
            root.display(),
            dest.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Copying from {} to {}",
            root.display(),
            dest.display()
        ));
        fs::create_dir_all(dest)
            .map_err(|e| format!("Error creating destination {}: {}", dest.display(), e))?;
    }

    let mut report = CommandReport::default();
    let spinner = OutputFormatter::create_spinner(settings.output.progress && !dry_run);

    for entry in select(&selection, root, walk, settings)? {
        let outcome = entry.and_then(|path| {
            report.matched += 1;
            let mapping = RelativeMapping::new(root, &path, Some(dest))?;
            if dry_run {
                if let Some(target) = mapping.destination_entry() {
                    OutputFormatter::plain(&format!(
                        " - {} → {}",
                        path.display(),
                        target.display()
                    ));
                }
                return Ok(());
            }
            spinner.set_message(path.display().to_string());
            mapping.copy_with_dirs()
        });

        spinner.inc(1);
        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                spinner.suspend(|| OutputFormatter::error(&e.to_string()));
                report.record_failure(&e);
            }
        }
    }
    spinner.finish_and_clear();

    OutputFormatter::batch_summary("COPY SUMMARY", &report);
    Ok(report)
}

/// Deletes every selected entry; directories go with their contents.
///
/// Matches are gathered before anything is removed, because removing a directory in
/// the middle of a walk would make the walk fail on it. Matches inside a directory
/// that was already removed are skipped.
fn delete_entries(
    root: &Path,
    selector: &Selector,
    walk: &WalkOptions,
    dry_run: bool,
    settings: &Settings,
) -> Result<CommandReport, String> {
    if selector.is_empty() {
        return Err("delete needs a selector (--name, --regex, --glob, --since or --pycache)"
            .to_string());
    }
    let selection = Selection::compile(selector, settings)?;
    let mut report = CommandReport::default();

    let mut targets = Vec::new();
    for entry in select(&selection, root, walk, settings)? {
        match entry {
            Ok(path) => targets.push(path),
            Err(e) => report.record_failure(&e),
        }
    }
    report.matched = targets.len();

    let mut removed_dirs: Vec<PathBuf> = Vec::new();
    for path in targets {
        if let Some(parent) = removed_dirs.iter().find(|dir| path.starts_with(dir)) {
            report
                .skipped
                .push((path.clone(), format!("inside removed {}", parent.display())));
            continue;
        }

        if dry_run {
            OutputFormatter::dry_run_notice(&format!(
                "Would delete {} {}",
                walk.kind.label(),
                path.display()
            ));
            report.succeeded += 1;
            continue;
        }

        match remove_entry(&path) {
            Ok(was_dir) => {
                debug!(path = %path.display(), "deleted");
                OutputFormatter::success(&format!(
                    "Deleted {} {}",
                    walk.kind.label(),
                    path.display()
                ));
                if was_dir {
                    removed_dirs.push(path);
                }
                report.succeeded += 1;
            }
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                report.record_failure(&e);
            }
        }
    }

    OutputFormatter::batch_summary("DELETE SUMMARY", &report);
    Ok(report)
}

/// Extracts `pattern` matches from the contents of the selected files.
///
/// A file root is scanned on its own and the selector is ignored. Unreadable files are
/// reported and counted; the output file is still written from the rest.
fn grep_files(
    root: &Path,
    out_dir: &Path,
    pattern: &str,
    selector: &Selector,
    walk: &WalkOptions,
    columns: &[String],
    settings: &Settings,
) -> Result<GrepReport, String> {
    let regex =
        Regex::new(pattern).map_err(|e| format!("Invalid regex pattern '{}': {}", pattern, e))?;
    let layout = GrepLayout::for_pattern(&regex, columns).map_err(|e| e.to_string())?;
    let selection = if PathKind::classify(root) == PathKind::File {
        Selection::All
    } else {
        Selection::compile(selector, settings)?
    };

    let mut report = CommandReport::default();
    let mut rows = Vec::new();
    let spinner = OutputFormatter::create_spinner(settings.output.progress);

    for entry in select(&selection, root, walk, settings)? {
        let outcome = entry.and_then(|path| {
            report.matched += 1;
            spinner.set_message(path.display().to_string());
            grep::scan_file(&path, &regex)
        });

        spinner.inc(1);
        match outcome {
            Ok(found) => {
                rows.extend(found);
                report.succeeded += 1;
            }
            Err(e) => {
                spinner.suspend(|| OutputFormatter::error(&e.to_string()));
                report.record_failure(&e);
            }
        }
    }
    spinner.finish_and_clear();

    let output = grep::write_rows(out_dir, &layout, &rows).map_err(|e| e.to_string())?;
    if rows.is_empty() {
        OutputFormatter::warning("Pattern matched nothing");
    }
    OutputFormatter::success(&format!("Created {} ({} rows)", output.display(), rows.len()));
    OutputFormatter::batch_summary("GREP SUMMARY", &report);

    info!(files = report.matched, rows = rows.len(), "grep finished");
    Ok(GrepReport {
        batch: report,
        rows: rows.len(),
        output,
    })
}

/// Removes a file or a whole directory. Returns whether it was a directory.
fn remove_entry(path: &Path) -> TreeResult<bool> {
    let meta = fs::symlink_metadata(path).map_err(|e| TreeError::filesystem(path, e))?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| TreeError::filesystem(path, e))?;
        Ok(true)
    } else {
        fs::remove_file(path).map_err(|e| TreeError::filesystem(path, e))?;
        Ok(false)
    }
}
