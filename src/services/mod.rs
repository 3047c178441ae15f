//! Business logic services

pub mod catalog;
pub mod loans;
pub mod qr;
pub mod stats;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let qr = qr::QrService::new(config.qr.clone());
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), qr),
            loans: loans::LoansService::new(repository.clone(), config.loans.clone()),
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }
}

#[cfg(test)]
pub(crate) async fn test_services(config: &AppConfig) -> Services {
    Services::new(crate::repository::test_repository().await, config)
}
