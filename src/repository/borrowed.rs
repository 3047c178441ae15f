//! Borrow ledger repository
//!
//! Borrow and return each run in a single transaction that touches both the
//! ledger row and the book's availability flag. The partial unique index
//! `idx_borrowed_open_book` backs the "one open record per book" rule, so a
//! concurrent double borrow fails instead of producing two open rows.

use chrono::{Duration, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowQuery, BorrowRecord},
};

const SELECT_RECORD: &str = r#"
    SELECT b.id, b.book_id, bk.title AS book_title, b.student_name,
           b.borrow_date, b.due_date, b.return_date
    FROM borrowed b
    JOIN books bk ON bk.id = b.book_id
"#;

#[derive(Clone)]
pub struct BorrowedRepository {
    pool: Pool<Sqlite>,
}

impl BorrowedRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a ledger record by ID, open or closed
    pub async fn get_by_id(&self, id: i64) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(&format!("{} WHERE b.id = ?", SELECT_RECORD))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", id)))
    }

    /// Find the open record for a student and book title
    pub async fn find_open(&self, student_name: &str, book_title: &str) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(&format!(
            "{} WHERE b.student_name = ? AND bk.title = ? AND b.return_date IS NULL",
            SELECT_RECORD
        ))
        .bind(student_name)
        .bind(book_title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No open borrow record for '{}' by {}",
                book_title, student_name
            ))
        })
    }

    /// Lend a book: flip its flag and append an open ledger row, atomically.
    /// The claim is the first statement so the transaction holds the write
    /// lock before it reads anything.
    pub async fn borrow(
        &self,
        book_id: i64,
        student_name: &str,
        borrow_period: Duration,
        max_per_student: u32,
    ) -> AppResult<BorrowRecord> {
        let now = Utc::now();
        let due_date = now + borrow_period;
        let mut tx = self.pool.begin().await?;

        // Check and claim in one statement
        let claimed = sqlx::query("UPDATE books SET available = 0 WHERE id = ? AND available = 1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)
            .map_err(unavailable_on_conflict)?
            .rows_affected();

        if claimed == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
                .bind(book_id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(if exists {
                unavailable()
            } else {
                AppError::NotFound(format!("Book with id {} not found", book_id))
            });
        }

        if max_per_student > 0 {
            let current: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM borrowed WHERE student_name = ? AND return_date IS NULL",
            )
            .bind(student_name)
            .fetch_one(&mut *tx)
            .await?;

            if current >= max_per_student as i64 {
                return Err(AppError::LimitReached(format!(
                    "Maximum borrowed books reached ({}/{})",
                    current, max_per_student
                )));
            }
        }

        let record_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO borrowed (book_id, student_name, borrow_date, due_date)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(student_name)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)
        .map_err(unavailable_on_conflict)?;

        let record = sqlx::query_as::<_, BorrowRecord>(&format!("{} WHERE b.id = ?", SELECT_RECORD))
            .bind(record_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// Close an open record and make its book available again, atomically
    pub async fn close(&self, record_id: i64) -> AppResult<BorrowRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query("UPDATE borrowed SET return_date = ? WHERE id = ? AND return_date IS NULL")
            .bind(now)
            .bind(record_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if closed == 0 {
            return Err(AppError::NotFound(format!(
                "No open borrow record with id {}",
                record_id
            )));
        }

        sqlx::query("UPDATE books SET available = 1 WHERE id = (SELECT book_id FROM borrowed WHERE id = ?)")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, BorrowRecord>(&format!("{} WHERE b.id = ?", SELECT_RECORD))
            .bind(record_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// List ledger records, most recent borrow first
    pub async fn list(&self, query: &BorrowQuery) -> AppResult<Vec<BorrowRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_RECORD);
        builder.push(" WHERE 1 = 1");

        match query.open {
            Some(true) => {
                builder.push(" AND b.return_date IS NULL");
            }
            Some(false) => {
                builder.push(" AND b.return_date IS NOT NULL");
            }
            None => {}
        }
        if let Some(ref student) = query.student_name {
            builder.push(" AND b.student_name = ").push_bind(student.trim().to_string());
        }
        builder.push(" ORDER BY b.borrow_date DESC, b.id DESC");

        let records = builder
            .build_query_as::<BorrowRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Count open records
    pub async fn count_open(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowed WHERE return_date IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn unavailable() -> AppError {
    AppError::Unavailable("Book is not available for borrowing".to_string())
}

/// A second open row or a writer still holding the lock both mean the book was taken
fn unavailable_on_conflict(e: AppError) -> AppError {
    if e.is_unique_violation() || e.is_busy() {
        unavailable()
    } else {
        e
    }
}
