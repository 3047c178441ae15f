//! Borrow/return service

use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowBook, BorrowQuery, BorrowRecord, ReturnBook},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Lend a book to a student
    pub async fn borrow_book(&self, session: &UserClaims, request: BorrowBook) -> AppResult<BorrowRecord> {
        let request = request.normalized();
        request.validate()?;

        let book = match (request.book_id, request.book_title.as_deref()) {
            (Some(id), _) => self.repository.books.get_by_id(id).await?,
            (None, Some(title)) => self.repository.books.get_by_title(title).await?,
            (None, None) => {
                return Err(AppError::Validation(
                    "book_id or book_title required".to_string(),
                ))
            }
        };

        if !book.available {
            return Err(AppError::Unavailable(
                "Book is not available for borrowing".to_string(),
            ));
        }

        let period = Duration::days(self.config.borrow_period_days as i64);
        let record = self
            .repository
            .borrowed
            .borrow(book.id, &request.student_name, period, self.config.max_per_student)
            .await?;

        tracing::info!(
            record_id = record.id,
            book_id = book.id,
            student = %record.student_name,
            librarian = %session.username(),
            "Book borrowed"
        );
        Ok(record.with_overdue(Utc::now()))
    }

    /// Return by ledger record ID
    pub async fn return_book(&self, session: &UserClaims, record_id: i64) -> AppResult<BorrowRecord> {
        let record = self.repository.borrowed.close(record_id).await?;
        tracing::info!(
            record_id = record.id,
            book_id = record.book_id,
            librarian = %session.username(),
            "Book returned"
        );
        Ok(record)
    }

    /// Return by student name and book title
    pub async fn return_by_student(&self, session: &UserClaims, request: ReturnBook) -> AppResult<BorrowRecord> {
        let request = request.normalized();
        request.validate()?;

        let open = self
            .repository
            .borrowed
            .find_open(&request.student_name, &request.book_title)
            .await?;
        self.return_book(session, open.id).await
    }

    /// Get a single ledger record
    pub async fn get_record(&self, id: i64) -> AppResult<BorrowRecord> {
        let record = self.repository.borrowed.get_by_id(id).await?;
        Ok(record.with_overdue(Utc::now()))
    }

    /// List ledger records
    pub async fn list_borrowed(&self, query: &BorrowQuery) -> AppResult<Vec<BorrowRecord>> {
        let now = Utc::now();
        let records = self.repository.borrowed.list(query).await?;
        Ok(records.into_iter().map(|r| r.with_overdue(now)).collect())
    }
}
