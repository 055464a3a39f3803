use crate::isbn::{Isbn, SeenSet};
use crate::lookup::Record;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Conventional ledger file name
pub const DEFAULT_LEDGER: &str = "dokuwiki.txt";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to append to ledger {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Append-only DokuWiki table of previously processed books
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collect the ISBNs of every table row. A missing file is an empty ledger.
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub fn load(&self) -> Result<SeenSet, LedgerError> {
        if !self.path.exists() {
            return Ok(SeenSet::new());
        }

        let bytes = fs::read(&self.path).map_err(|source| LedgerError::Read {
            path: self.path.clone(),
            source,
        })?;

        Ok(parse_ledger(&String::from_utf8_lossy(&bytes)))
    }

    /// Identifiers known at startup; empty when the ledger is not to be read
    pub fn initial_seen(&self, blind: bool) -> Result<SeenSet, LedgerError> {
        if blind {
            debug!(path = %self.path.display(), "Skipping ledger read");
            return Ok(SeenSet::new());
        }
        self.load()
    }

    /// Append one row on a new line, creating the file if needed
    pub fn append(&self, row: &str) -> Result<(), LedgerError> {
        let to_write_error = |source: io::Error| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_write_error)?;

        write!(file, "\n{}", row).map_err(to_write_error)
    }
}

/// Extract the identifiers from ledger text, skipping anything that is not
/// a well-formed table row
pub fn parse_ledger(content: &str) -> SeenSet {
    content
        .lines()
        .filter_map(row_isbn)
        .filter(|isbn| !isbn.is_empty())
        .collect()
}

/// The ISBN is the leading run of the last cell; the hidden comment after it
/// is ignored
fn row_isbn(line: &str) -> Option<Isbn> {
    let row = line.trim().strip_prefix('|')?;
    let last_cell = row.trim_end_matches('|').rsplit('|').next()?;

    let cell = last_cell.trim_start();
    let mut end = cell
        .find(|c: char| !(c.is_ascii_digit() || c == '-'))
        .unwrap_or(cell.len());
    // ISBN-10 check character
    if end > 0 && cell[end..].starts_with(['X', 'x']) {
        end += 1;
    }

    Some(Isbn::normalize(&cell[..end]))
}

/// Format one DokuWiki table row. Pipes cannot be escaped in DokuWiki
/// tables, so they are removed from the free-text fields.
pub fn format_row(
    record: &Record,
    isbn: &Isbn,
    timestamp: DateTime<FixedOffset>,
    comment: &str,
) -> String {
    let hidden = [
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
        comment.to_string(),
    ]
    .join(" - ");

    format!(
        "| {} | {} | {} | {} | {} <html><!-- {} --></html> |",
        strip_pipes(&record.author),
        strip_pipes(&record.title),
        strip_pipes(&record.publisher),
        record.publication_year,
        isbn,
        hidden
    )
}

fn strip_pipes(s: &str) -> String {
    s.replace('|', "")
}
