pub use async_trait::async_trait;

pub mod amazon;

use crate::isbn::Isbn;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Failed to sign request: {0}")]
    SigningError(String),
}

/// Regional catalog endpoint, tried in a configured fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Us,
    Uk,
    De,
    Fr,
    Ca,
    Jp,
    It,
    Es,
}

impl Locale {
    /// Host serving the Product Advertising API for this locale
    pub fn host(&self) -> &'static str {
        match self {
            Locale::Us => "webservices.amazon.com",
            Locale::Uk => "webservices.amazon.co.uk",
            Locale::De => "webservices.amazon.de",
            Locale::Fr => "webservices.amazon.fr",
            Locale::Ca => "webservices.amazon.ca",
            Locale::Jp => "webservices.amazon.co.jp",
            Locale::It => "webservices.amazon.it",
            Locale::Es => "webservices.amazon.es",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Locale::Us => "us",
            Locale::Uk => "uk",
            Locale::De => "de",
            Locale::Fr => "fr",
            Locale::Ca => "ca",
            Locale::Jp => "jp",
            Locale::It => "it",
            Locale::Es => "es",
        };
        f.write_str(code)
    }
}

/// An error reported by the catalog inside an otherwise valid response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A contributor listed with an explicit role (editor, illustrator, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub role: Option<String>,
    pub name: String,
}

/// Bibliographic attributes of one catalog item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    pub authors: Vec<String>,
    pub creators: Vec<Creator>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<String>,
}

/// Decoded reply to an ISBN lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemLookupResponse {
    pub errors: Vec<ApiError>,
    pub items: Vec<ItemAttributes>,
}

impl ItemLookupResponse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn first_item(&self) -> Option<&ItemAttributes> {
        self.items.first()
    }
}

/// Remote product catalog searched by ISBN
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up an ISBN across all categories in the given locale, asking for
    /// the most detailed response available
    async fn item_lookup(
        &self,
        locale: Locale,
        isbn: &Isbn,
    ) -> Result<ItemLookupResponse, CatalogError>;

    /// Get the name of this catalog
    fn name(&self) -> &'static str;
}
