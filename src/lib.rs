//! SmartLib Library Management System
//!
//! A REST JSON server for a small library: book catalog, borrow/return
//! ledger, user accounts and QR codes for catalog entries.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Open the database, seed the admin account and wire the services
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        let pool = repository::create_pool(&config.database).await?;
        let services = services::Services::new(repository::Repository::new(pool), &config);
        services.users.ensure_default_admin(&config.users).await?;

        Ok(Self {
            services: Arc::new(services),
        })
    }
}
