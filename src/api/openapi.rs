//! OpenAPI documentation

use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::{auth, books, health, loans, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SmartLib API",
        version = "1.0.0",
        description = "Library catalog, borrow/return ledger and accounts"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::register_book,
        books::available_titles,
        books::get_book,
        books::book_qr,
        books::book_qr_png,
        // Loans
        loans::list_borrowed,
        loans::borrow_book,
        loans::get_record,
        loans::return_book,
        loans::return_by_student,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            crate::models::user::User,
            crate::models::user::RegisterUser,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            books::QrCodeResponse,
            // Loans
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowBook,
            crate::models::borrow::ReturnBook,
            loans::ReturnResponse,
            // Stats
            crate::services::stats::LibraryStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Borrow and return"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_operations() {
        let doc = ApiDoc::openapi();
        for path in ["/books", "/loans", "/loans/{id}/return", "/loans/return", "/auth/login"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
