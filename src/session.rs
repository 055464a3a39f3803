use crate::catalog::{Catalog, Locale};
use crate::isbn::{Isbn, SeenSet};
use crate::ledger::{format_row, Ledger};
use crate::lookup::{lookup, LookupError};
use chrono::Local;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::debug;

pub const DISCLAIMER: &str = "CERTAIN CONTENT THAT APPEARS IN THIS APPLICATION COMES FROM AMAZON EU S.à.r.l. \
THIS CONTENT IS PROVIDED 'AS IS' AND IS SUBJECT TO CHANGE OR REMOVAL AT ANY TIME.";

/// What happened to one entered ISBN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already in the ledger; no lookup was issued
    Duplicate,
    /// Every locale failed
    NotFound,
    Saved,
    /// Found, but saving is disabled
    DryRun,
    /// Found, but the ledger could not be written
    WriteFailed,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Append found books to the ledger
    pub save: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { save: true }
    }
}

/// Interactive prompt loop: read an ISBN, look it up, record it
pub struct Session<C, W> {
    catalog: C,
    locales: Vec<Locale>,
    ledger: Ledger,
    seen: SeenSet,
    options: SessionOptions,
    out: W,
}

impl<C: Catalog, W: Write> Session<C, W> {
    pub fn new(
        catalog: C,
        locales: Vec<Locale>,
        ledger: Ledger,
        seen: SeenSet,
        options: SessionOptions,
        out: W,
    ) -> Self {
        Self {
            catalog,
            locales,
            ledger,
            seen,
            options,
            out,
        }
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Prompt until a blank line or end of input
    pub async fn run<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        writeln!(self.out, "{}", DISCLAIMER.dimmed())?;

        let mut buf = Vec::new();
        loop {
            debug!(seen = ?self.seen, "Known ISBNs");
            write!(self.out, "\n[Press RETURN to quit]\nISBN to lookup: ")?;
            self.out.flush()?;

            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            writeln!(self.out)?;

            let Ok(line) = std::str::from_utf8(&buf) else {
                writeln!(
                    self.out,
                    "{}",
                    "*** Input is not valid UTF-8 -- skipping".yellow()
                )?;
                continue;
            };
            let isbn = Isbn::normalize(line);

            if isbn.is_empty() {
                break;
            }

            self.process(&isbn).await?;
        }

        Ok(())
    }

    /// Handle one normalized, non-empty ISBN
    pub async fn process(&mut self, isbn: &Isbn) -> io::Result<Outcome> {
        if self.seen.contains(isbn) {
            writeln!(
                self.out,
                "{}",
                "*** This ISBN already exists in our library -- skipping".yellow()
            )?;
            return Ok(Outcome::Duplicate);
        }

        let record = match lookup(&self.catalog, isbn, &self.locales).await {
            Ok(record) => record,
            Err(LookupError::Exhausted { failures, .. }) => {
                debug!(attempts = failures.len(), "Lookup exhausted");
                writeln!(
                    self.out,
                    "{}",
                    "*** Locales exhausted; no valid information found.".red()
                )?;
                return Ok(Outcome::NotFound);
            }
        };

        writeln!(self.out, "\n{}", "Result:".bold())?;
        writeln!(self.out, "{}\n", record)?;

        if !self.options.save {
            writeln!(
                self.out,
                "{}",
                "*** Saving to file disabled - doing nothing".yellow()
            )?;
            return Ok(Outcome::DryRun);
        }

        writeln!(self.out, "{}", "*** Adding this book to the library.".green())?;
        let comment = format!("Amazon Locale: {}", record.locale);
        let row = format_row(&record, isbn, Local::now().into(), &comment);

        match self.ledger.append(&row) {
            Ok(()) => {
                self.seen.insert(isbn.clone());
                Ok(Outcome::Saved)
            }
            Err(e) => {
                writeln!(self.out, "{} {}", "Error:".red().bold(), e)?;
                Ok(Outcome::WriteFailed)
            }
        }
    }
}
