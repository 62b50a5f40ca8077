//! Extraction of regex matches from file contents.
//!
//! A pattern without capture groups yields one row per match holding the whole match;
//! those rows are written as lines to [`LINES_FILE`]. A pattern with groups yields one
//! value per group and the rows are written as a table to [`TABLE_FILE`].

use crate::error::{TreeError, TreeResult};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Output file for patterns without capture groups.
pub const LINES_FILE: &str = "grep.txt";

/// Output file for patterns with capture groups.
pub const TABLE_FILE: &str = "grep.csv";

/// Errors raised while preparing a grep run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrepError {
    /// The number of column names differs from the pattern's group count.
    ColumnCount { expected: usize, given: usize },
}

impl fmt::Display for GrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrepError::ColumnCount { expected, given } => write!(
                f,
                "Pattern has {} capture group(s) but {} column name(s) were given",
                expected, given
            ),
        }
    }
}

impl std::error::Error for GrepError {}

/// How extracted rows are written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrepLayout {
    /// One whole match per line.
    Lines,
    /// A table with one named column per capture group.
    Table(Vec<String>),
}

impl GrepLayout {
    /// Picks the layout for `pattern`.
    ///
    /// Empty `columns` means default names: the group's own name, else `group<N>`.
    pub fn for_pattern(pattern: &Regex, columns: &[String]) -> Result<Self, GrepError> {
        let groups = group_count(pattern);
        if !columns.is_empty() && columns.len() != groups {
            return Err(GrepError::ColumnCount {
                expected: groups,
                given: columns.len(),
            });
        }
        if groups == 0 {
            return Ok(Self::Lines);
        }
        if !columns.is_empty() {
            return Ok(Self::Table(columns.to_vec()));
        }
        let names = pattern
            .capture_names()
            .skip(1)
            .enumerate()
            .map(|(i, name)| name.map_or_else(|| format!("group{}", i + 1), str::to_string))
            .collect();
        Ok(Self::Table(names))
    }

    /// Name of the file this layout writes.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Lines => LINES_FILE,
            Self::Table(_) => TABLE_FILE,
        }
    }
}

fn group_count(pattern: &Regex) -> usize {
    pattern.captures_len() - 1
}

/// Collects every non-overlapping match of `pattern` in `text`.
///
/// Unmatched optional groups give empty strings.
pub fn extract_rows(text: &str, pattern: &Regex) -> Vec<Vec<String>> {
    let groups = group_count(pattern);
    pattern
        .captures_iter(text)
        .map(|caps| {
            if groups == 0 {
                vec![caps[0].to_string()]
            } else {
                (1..=groups)
                    .map(|i| caps.get(i).map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect()
            }
        })
        .collect()
}

/// Reads `path` and extracts its matches. Bytes that are not UTF-8 are replaced.
pub fn scan_file(path: &Path, pattern: &Regex) -> TreeResult<Vec<Vec<String>>> {
    let bytes = fs::read(path).map_err(|e| TreeError::filesystem(path, e))?;
    let rows = extract_rows(&String::from_utf8_lossy(&bytes), pattern);
    trace!(path = %path.display(), rows = rows.len(), "scanned");
    Ok(rows)
}

/// Writes `rows` into `out_dir` using `layout`, creating the directory when missing.
///
/// Returns the path of the written file.
pub fn write_rows(
    out_dir: &Path,
    layout: &GrepLayout,
    rows: &[Vec<String>],
) -> TreeResult<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|e| TreeError::filesystem(out_dir, e))?;
    let body = match layout {
        GrepLayout::Lines => rows.iter().map(|row| row.concat()).collect::<Vec<_>>().join("\n"),
        GrepLayout::Table(columns) => render_table(columns, rows),
    };
    let target = out_dir.join(layout.file_name());
    fs::write(&target, body).map_err(|e| TreeError::filesystem(&target, e))?;
    debug!(path = %target.display(), rows = rows.len(), "wrote grep output");
    Ok(target)
}

/// Header row first; the leading column is an unnamed row index.
fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_record(
        &mut out,
        std::iter::once("").chain(columns.iter().map(String::as_str)),
    );
    for (index, row) in rows.iter().enumerate() {
        let index = index.to_string();
        push_record(
            &mut out,
            std::iter::once(index.as_str()).chain(row.iter().map(String::as_str)),
        );
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_whole_matches_without_groups() {
        let pattern = Regex::new(r"\d+").unwrap();
        let rows = extract_rows("a1 b22 c333", &pattern);
        assert_eq!(rows, vec![vec!["1"], vec!["22"], vec!["333"]]);
    }

    #[test]
    fn test_extract_groups_with_optional_miss() {
        let pattern = Regex::new(r"(\w+)=(\d+)?;").unwrap();
        let rows = extract_rows("a=1;b=;", &pattern);
        assert_eq!(rows, vec![vec!["a", "1"], vec!["b", ""]]);
    }

    #[test]
    fn test_layout_column_names() {
        let plain = Regex::new("abc").unwrap();
        assert_eq!(GrepLayout::for_pattern(&plain, &[]).unwrap(), GrepLayout::Lines);

        let named = Regex::new(r"(?P<key>\w+)=(\d+)").unwrap();
        assert_eq!(
            GrepLayout::for_pattern(&named, &[]).unwrap(),
            GrepLayout::Table(vec!["key".to_string(), "group2".to_string()])
        );

        let given = vec!["k".to_string(), "v".to_string()];
        assert_eq!(
            GrepLayout::for_pattern(&named, &given).unwrap(),
            GrepLayout::Table(given.clone())
        );
    }

    #[test]
    fn test_layout_rejects_wrong_column_count() {
        let named = Regex::new(r"(\w+)=(\d+)").unwrap();
        let result = GrepLayout::for_pattern(&named, &["only".to_string()]);
        assert_eq!(
            result,
            Err(GrepError::ColumnCount {
                expected: 2,
                given: 1
            })
        );

        let plain = Regex::new("abc").unwrap();
        assert!(GrepLayout::for_pattern(&plain, &["x".to_string()]).is_err());
    }

    #[test]
    fn test_scan_file_tolerates_invalid_utf8() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("mixed.log");
        fs::write(&path, b"id=7 \xff\xfe id=42").unwrap();

        let pattern = Regex::new(r"id=(\d+)").unwrap();
        let rows = scan_file(&path, &pattern).unwrap();
        assert_eq!(rows, vec![vec!["7"], vec!["42"]]);
    }

    #[test]
    fn test_write_table_quotes_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let out = temp_dir.path().join("out");
        let layout = GrepLayout::Table(vec!["name".to_string(), "note".to_string()]);
        let rows = vec![
            vec!["a".to_string(), "x,y".to_string()],
            vec!["b".to_string(), "say \"hi\"".to_string()],
        ];

        let written = write_rows(&out, &layout, &rows).unwrap();
        assert_eq!(written, out.join(TABLE_FILE));
        assert_eq!(
            fs::read_to_string(&written).unwrap(),
            ",name,note\n0,a,\"x,y\"\n1,b,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_write_lines_has_no_trailing_newline() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let rows = vec![vec!["one".to_string()], vec!["two".to_string()]];

        let written = write_rows(temp_dir.path(), &GrepLayout::Lines, &rows).unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "one\ntwo");
    }
}
