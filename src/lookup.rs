use crate::catalog::{ApiError, Catalog, CatalogError, ItemAttributes, Locale};
use crate::isbn::Isbn;
use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Creator roles that stand in for a missing author
const EDITOR_ROLES: &[&str] = &["Editor", "Herausgeber"];
const EDITOR_SUFFIX: &str = " (Hrsg.)";

/// Full calendar date layouts tried before the year-only fallback
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"];

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(?:-\d{1,2})?$").expect("valid year pattern"));

/// A book resolved from one catalog response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub author: String,
    pub title: String,
    pub publisher: String,
    /// Publication date as returned by the catalog
    pub publication_date: String,
    pub publication_year: i32,
    /// Locale whose response produced this record
    pub locale: Locale,
}

/// Outcome of parsing a catalog publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationYear {
    Parsed(i32),
    Unparseable,
}

/// Parse a publication date into its year: full calendar dates first, then a
/// bare `YYYY` or `YYYY-M(M)`.
pub fn parse_publication_year(raw: &str) -> PublicationYear {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return PublicationYear::Parsed(date.year());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return PublicationYear::Parsed(date.year());
        }
    }

    YEAR_MONTH
        .captures(raw)
        .and_then(|caps| caps[1].parse().ok())
        .map_or(PublicationYear::Unparseable, PublicationYear::Parsed)
}

/// Pick the display author: `Author` values win, then the first editor
/// among the creators.
pub fn resolve_author(attributes: &ItemAttributes) -> Option<String> {
    if !attributes.authors.is_empty() {
        return Some(attributes.authors.join(", "));
    }

    attributes
        .creators
        .iter()
        .find(|c| {
            c.role
                .as_deref()
                .is_some_and(|role| EDITOR_ROLES.contains(&role))
        })
        .map(|editor| format!("{}{}", editor.name, EDITOR_SUFFIX))
}

/// Why a single locale could not produce a record
#[derive(Error, Debug)]
pub enum LocaleFailure {
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
    #[error("No valid response received ({})", join_errors(.0))]
    Api(Vec<ApiError>),
    #[error("The response contains no item")]
    NoItem,
    #[error("A required key is missing from the response: {0}")]
    MissingField(&'static str),
    #[error("The returned date is not valid: {0}")]
    InvalidDate(String),
}

fn join_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Locales exhausted; no valid information found for {isbn}")]
    Exhausted {
        isbn: Isbn,
        failures: Vec<(Locale, LocaleFailure)>,
    },
}

/// Turn the first item of a response into a record, or explain why not
pub fn extract_record(
    attributes: &ItemAttributes,
    locale: Locale,
) -> Result<Record, LocaleFailure> {
    let author = resolve_author(attributes).ok_or(LocaleFailure::MissingField("Author"))?;
    let title = attributes
        .title
        .clone()
        .ok_or(LocaleFailure::MissingField("Title"))?;
    let publisher = attributes
        .publisher
        .clone()
        .ok_or(LocaleFailure::MissingField("Publisher"))?;
    let publication_date = attributes
        .publication_date
        .clone()
        .ok_or(LocaleFailure::MissingField("PublicationDate"))?;

    let publication_year = match parse_publication_year(&publication_date) {
        PublicationYear::Parsed(year) => year,
        PublicationYear::Unparseable => {
            return Err(LocaleFailure::InvalidDate(publication_date));
        }
    };

    Ok(Record {
        author,
        title,
        publisher,
        publication_date,
        publication_year,
        locale,
    })
}

async fn lookup_in_locale<C: Catalog + ?Sized>(
    catalog: &C,
    isbn: &Isbn,
    locale: Locale,
) -> Result<Record, LocaleFailure> {
    let response = catalog.item_lookup(locale, isbn).await?;

    if response.has_errors() {
        debug!(errors = ?response.errors, "{} reported errors", catalog.name());
        return Err(LocaleFailure::Api(response.errors));
    }

    let attributes = response.first_item().ok_or(LocaleFailure::NoItem)?;
    debug!(?attributes, "Item attributes");

    extract_record(attributes, locale)
}

/// Try each locale in order and return the first usable record
pub async fn lookup<C: Catalog + ?Sized>(
    catalog: &C,
    isbn: &Isbn,
    locales: &[Locale],
) -> Result<Record, LookupError> {
    let mut failures = Vec::new();

    for &locale in locales {
        info!("Looking up ISBN {} in the {} locale...", isbn, locale);

        match lookup_in_locale(catalog, isbn, locale).await {
            Ok(record) => {
                debug!(?record, "Resolved record");
                return Ok(record);
            }
            Err(failure) => {
                warn!("{} ({} locale)", failure, locale);
                failures.push((locale, failure));
            }
        }
    }

    Err(LookupError::Exhausted {
        isbn: isbn.clone(),
        failures,
    })
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Title: {}", self.title)?;
        writeln!(f, "  Author: {}", self.author)?;
        writeln!(f, "  Publisher: {}", self.publisher)?;
        write!(f, "  PublicationDate: {}", self.publication_date)
    }
}
