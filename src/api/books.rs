//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook},
};

use super::AuthenticatedUser;

/// QR code wrapped for JSON clients
#[derive(Serialize, ToSchema)]
pub struct QrCodeResponse {
    /// Base64-encoded PNG
    pub qr_code: String,
}

/// List books, newest first
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = Vec<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books(&query).await?;
    Ok(Json(books))
}

/// Register a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book registered", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Title or ISBN already exists")
    )
)]
pub async fn register_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.catalog.register_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Titles currently available for borrowing
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available titles, sorted", body = Vec<String>)
    )
)]
pub async fn available_titles(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    let titles = state.services.catalog.available_titles().await?;
    Ok(Json(titles))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// QR code for a book, base64 in JSON
#[utoipa::path(
    get,
    path = "/books/{id}/qr",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "QR code", body = QrCodeResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_qr(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<QrCodeResponse>> {
    let png = state.services.catalog.book_qr_png(id).await?;
    Ok(Json(QrCodeResponse {
        qr_code: STANDARD.encode(png),
    }))
}

/// QR code for a book as a PNG image
#[utoipa::path(
    get,
    path = "/books/{id}/qr.png",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "PNG image (image/png)"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_qr_png(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let png = state.services.catalog.book_qr_png(id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
