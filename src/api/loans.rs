//! Borrow/return endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{BorrowBook, BorrowQuery, BorrowRecord, ReturnBook},
};

use super::AuthenticatedUser;

/// Return response with the closed record
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    pub record: BorrowRecord,
}

/// List borrow records, most recent first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "Borrow records", body = Vec<BorrowRecord>)
    )
)]
pub async fn list_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let records = state.services.loans.list_borrowed(&query).await?;
    Ok(Json(records))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BorrowBook,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is not available"),
        (status = 422, description = "Student reached the borrow limit")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowBook>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    let record = state.services.loans.borrow_book(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a borrow record
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Borrow record", body = BorrowRecord),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_record(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowRecord>> {
    let record = state.services.loans.get_record(id).await?;
    Ok(Json(record))
}

/// Return a borrowed book by record ID
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "No open record with this ID")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ReturnResponse>> {
    let record = state.services.loans.return_book(&claims, id).await?;
    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        record,
    }))
}

/// Return a borrowed book by student name and title
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = ReturnBook,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "No open record for this student and title")
    )
)]
pub async fn return_by_student(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReturnBook>,
) -> AppResult<Json<ReturnResponse>> {
    let record = state.services.loans.return_by_student(&claims, request).await?;
    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        record,
    }))
}
