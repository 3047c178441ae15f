//! Borrow ledger model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{non_blank, normalize_title};

/// One lend transaction. Open until `return_date` is set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub student_name: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl BorrowRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Fill the computed overdue flag
    pub fn with_overdue(mut self, now: DateTime<Utc>) -> Self {
        self.is_overdue = self.is_open() && self.due_date < now;
        self
    }
}

/// Borrow request. The book is identified by id or by title.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BorrowBook {
    #[validate(length(min = 1, max = 100, message = "Student name is required (max 100 characters)"))]
    pub student_name: String,
    pub book_id: Option<i64>,
    pub book_title: Option<String>,
}

impl BorrowBook {
    pub fn by_title(student_name: impl Into<String>, book_title: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            book_id: None,
            book_title: Some(book_title.into()),
        }
    }

    pub fn by_id(student_name: impl Into<String>, book_id: i64) -> Self {
        Self {
            student_name: student_name.into(),
            book_id: Some(book_id),
            book_title: None,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            student_name: self.student_name.trim().to_string(),
            book_id: self.book_id,
            book_title: non_blank(self.book_title).map(|t| normalize_title(&t)),
        }
    }
}

/// Return request for front ends that know the student and title, not the record id
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReturnBook {
    #[validate(length(min = 1, message = "Student name is required"))]
    pub student_name: String,
    #[validate(length(min = 1, message = "Book title is required"))]
    pub book_title: String,
}

impl ReturnBook {
    pub fn new(student_name: impl Into<String>, book_title: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            book_title: book_title.into(),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            student_name: self.student_name.trim().to_string(),
            book_title: normalize_title(&self.book_title),
        }
    }
}

/// Ledger list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowQuery {
    /// true: only open records, false: only closed ones
    pub open: Option<bool>,
    pub student_name: Option<String>,
}
