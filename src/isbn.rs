use std::collections::HashSet;
use std::fmt;

/// A normalized ISBN, used as the deduplication key for the ledger.
///
/// Normalization only trims surrounding whitespace and drops hyphens. The
/// check digit is not validated, and the ISBN-10 and ISBN-13 forms of the
/// same book are distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Isbn(String);

impl Isbn {
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().chars().filter(|&c| c != '-').collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiers already recorded in the ledger or saved during this run
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    isbns: HashSet<Isbn>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, isbn: &Isbn) -> bool {
        self.isbns.contains(isbn)
    }

    /// Returns `false` if the identifier was already present
    pub fn insert(&mut self, isbn: Isbn) -> bool {
        self.isbns.insert(isbn)
    }

    pub fn len(&self) -> usize {
        self.isbns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.isbns.is_empty()
    }
}

impl FromIterator<Isbn> for SeenSet {
    fn from_iter<I: IntoIterator<Item = Isbn>>(iter: I) -> Self {
        Self {
            isbns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_hyphens_and_whitespace() {
        assert_eq!(Isbn::normalize("  978-3-16-148410-0\n").as_str(), "9783161484100");
        assert_eq!(Isbn::normalize("0-8044-2957-X").as_str(), "080442957X");
        assert!(Isbn::normalize(" \n").is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["978-3-16-148410-0", " 3-16 ", "--", "", "9783161484100"] {
            let once = Isbn::normalize(raw);
            let twice = Isbn::normalize(once.as_str());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_isbn10_and_isbn13_stay_distinct() {
        let seen: SeenSet = [Isbn::normalize("3-16-148410-X")].into_iter().collect();
        assert!(!seen.contains(&Isbn::normalize("978-3-16-148410-0")));
    }

    #[test]
    fn test_seen_set_insert_reports_duplicates() {
        let mut seen = SeenSet::new();
        assert!(seen.insert(Isbn::normalize("123")));
        assert!(!seen.insert(Isbn::normalize("1-2-3")));
        assert_eq!(seen.len(), 1);
    }
}
