//! Data models for SmartLib

pub mod book;
pub mod borrow;
pub mod user;

use unicode_normalization::UnicodeNormalization;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook};
pub use borrow::{BorrowBook, BorrowQuery, BorrowRecord, ReturnBook};
pub use user::{RegisterUser, User, UserClaims};

/// Trim and NFC-normalize a title so lookups match what was stored
pub fn normalize_title(title: &str) -> String {
    title.trim().nfc().collect()
}

/// Trim an optional form field, treating blank input as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_composes_accents() {
        // "e" + combining acute accent
        let decomposed = "  Les Mise\u{301}rables ";
        assert_eq!(normalize_title(decomposed), "Les Mis\u{e9}rables");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" Herbert ".into())), Some("Herbert".into()));
        assert_eq!(non_blank(None), None);
    }
}
