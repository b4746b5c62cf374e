//! Business logic services

pub mod availability;
pub mod catalog;
pub mod lending;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub users: users::UsersService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let engine = availability::AvailabilityEngine::new(Arc::new(repository.copies.clone()));
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), engine),
            users: users::UsersService::new(repository.clone(), auth_config),
            repository,
        }
    }
}
