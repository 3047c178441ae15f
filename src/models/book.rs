//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{non_blank, normalize_title};

/// ISBN-10 or ISBN-13, hyphens allowed
static ISBN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9][0-9-]{8,17}[0-9Xx]$").expect("valid ISBN regex"));

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    /// False while an open borrow record exists for this book
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Text encoded in the book's QR code
    pub fn qr_payload(&self) -> String {
        let mut payload = format!("Book: {}", self.title);
        if let Some(ref author) = self.author {
            payload.push_str(&format!("\nAuthor: {}", author));
        }
        if let Some(ref isbn) = self.isbn {
            payload.push_str(&format!("\nISBN: {}", isbn));
        }
        payload
    }
}

/// Register book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Book title is required (max 200 characters)"))]
    pub title: String,
    #[validate(length(max = 100, message = "Author name must be at most 100 characters"))]
    pub author: Option<String>,
    #[validate(regex(path = *ISBN_REGEX, message = "Invalid ISBN"))]
    pub isbn: Option<String>,
}

impl CreateBook {
    pub fn new(title: impl Into<String>, author: Option<&str>, isbn: Option<&str>) -> Self {
        Self {
            title: title.into(),
            author: author.map(str::to_string),
            isbn: isbn.map(str::to_string),
        }
    }

    /// Trimmed, NFC title; blank author/ISBN dropped
    pub fn normalized(self) -> Self {
        Self {
            title: normalize_title(&self.title),
            author: non_blank(self.author),
            isbn: non_blank(self.isbn),
        }
    }
}

/// Book list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Only books with this availability
    pub available: Option<bool>,
    /// Substring of the title
    pub title: Option<String>,
}
