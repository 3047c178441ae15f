//! Dashboard statistics

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

/// Counters shown on the dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct LibraryStats {
    pub total_books: i64,
    pub available_books: i64,
    pub borrowed_books: i64,
    pub total_users: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn library_stats(&self) -> AppResult<LibraryStats> {
        Ok(LibraryStats {
            total_books: self.repository.books.count_total().await?,
            available_books: self.repository.books.count_available().await?,
            borrowed_books: self.repository.borrowed.count_open().await?,
            total_users: self.repository.users.count().await?,
        })
    }
}
