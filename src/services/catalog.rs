//! Catalog management service

use std::path::Path;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
    repository::Repository,
    services::qr::QrService,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    qr: QrService,
}

impl CatalogService {
    pub fn new(repository: Repository, qr: QrService) -> Self {
        Self { repository, qr }
    }

    /// Register a new book, available for borrowing
    pub async fn register_book(&self, book: CreateBook) -> AppResult<Book> {
        let book = book.normalized();
        book.validate()?;

        if self.repository.books.title_exists(&book.title).await? {
            return Err(AppError::Duplicate(
                "A book with this title already exists".to_string(),
            ));
        }
        if let Some(ref isbn) = book.isbn {
            if self.repository.books.isbn_exists(isbn).await? {
                return Err(AppError::Duplicate(
                    "A book with this ISBN already exists".to_string(),
                ));
            }
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, title = %created.title, "Book registered");

        if let Some(dir) = self.qr.output_dir() {
            if let Err(e) = self.write_qr_file(dir, &created).await {
                tracing::warn!(book_id = created.id, "Could not save QR code: {}", e);
            }
        }

        Ok(created)
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// List books with optional filters
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    /// Titles offered by the borrow form
    pub async fn available_titles(&self) -> AppResult<Vec<String>> {
        self.repository.books.available_titles().await
    }

    /// PNG QR code describing a book
    pub async fn book_qr_png(&self, id: i64) -> AppResult<Vec<u8>> {
        let book = self.repository.books.get_by_id(id).await?;
        self.qr.encode_png(&book.qr_payload())
    }

    async fn write_qr_file(&self, dir: &str, book: &Book) -> AppResult<()> {
        let png = self.qr.encode_png(&book.qr_payload())?;
        let io = |e: std::io::Error| AppError::Internal(e.to_string());
        tokio::fs::create_dir_all(dir).await.map_err(io)?;
        let path = Path::new(dir).join(format!("book-{}.png", book.id));
        tokio::fs::write(&path, png).await.map_err(io)?;
        tracing::debug!(path = %path.display(), "QR code saved");
        Ok(())
    }
}
