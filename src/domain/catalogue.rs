use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

pub const DUPLICATE_ORDER_ID: &str = "E01040010";
pub const NO_FULL_CARD_NUMBERS_ALLOWED: &str = "E01240002";
pub const ACCESS_MISMATCH: &str = "E01110002";
pub const UNKNOWN_ERROR: &str = "EX1000301";
/// Recorded locally when an execution reply fails its checksum.
pub const CHECKSUM_MISMATCH: &str = "CHECKSUM_MISMATCH";

const BUILTIN: &str = include_str!("../../data/error_codes.csv");

#[derive(Debug, Deserialize)]
struct CatalogueRow {
    code: String,
    description: String,
}

/// Immutable lookup from gateway detail code to a readable description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCatalogue {
    descriptions: HashMap<String, String>,
}

impl ErrorCatalogue {
    /// The table shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_reader(BUILTIN.as_bytes())
    }

    /// Loads a `code,description` CSV table. Fields are trimmed.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source)
            .into_deserialize::<CatalogueRow>()
            .map(|row| {
                row.map(|row| (row.code, row.description))
                    .map_err(PaymentError::from)
            })
            .collect()
    }

    pub fn describe(&self, code: &str) -> Option<&str> {
        self.descriptions.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorCatalogue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            descriptions: iter
                .into_iter()
                .map(|(code, description)| (code.into(), description.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_descriptions() {
        let catalogue = ErrorCatalogue::builtin().unwrap();

        assert_eq!(
            catalogue.describe(DUPLICATE_ORDER_ID),
            Some("This order ID was used previously.")
        );
        assert_eq!(
            catalogue.describe(UNKNOWN_ERROR),
            Some("An unknown error occurred.")
        );
        assert!(catalogue.describe(CHECKSUM_MISMATCH).is_some());
        assert!(catalogue.describe(NO_FULL_CARD_NUMBERS_ALLOWED).is_some());
        assert!(catalogue.describe(ACCESS_MISMATCH).is_some());
    }

    #[test]
    fn test_builtin_catalogue_handles_quoted_commas() {
        let catalogue = ErrorCatalogue::builtin().unwrap();
        assert_eq!(
            catalogue.describe("E11010002"),
            Some("This transaction has not been settled, so it cannot be altered.")
        );
    }

    #[test]
    fn test_from_reader_trims_fields() {
        let data = "code, description\nE01040010,  This order ID was used previously.";
        let catalogue = ErrorCatalogue::from_reader(data.as_bytes()).unwrap();

        assert_eq!(catalogue.len(), 1);
        assert_eq!(
            catalogue.describe(DUPLICATE_ORDER_ID),
            Some("This order ID was used previously.")
        );
    }

    #[test]
    fn test_from_reader_rejects_short_row() {
        let data = "code,description\nE01040010";
        assert!(matches!(
            ErrorCatalogue::from_reader(data.as_bytes()),
            Err(PaymentError::CsvError(_))
        ));
    }

    #[test]
    fn test_unknown_code_is_absent() {
        let catalogue = ErrorCatalogue::from_iter([("A", "first")]);
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.describe("A"), Some("first"));
        assert_eq!(catalogue.describe("B"), None);
    }
}
