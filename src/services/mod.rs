//! Business logic services

pub mod identity;
pub mod visits;

use std::sync::Arc;

use crate::repository::Repository;

use identity::{IdentityResolver, RandomTokenProvider};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visits: visits::VisitsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let resolver = IdentityResolver::new(
            Arc::new(repository.users.clone()),
            Arc::new(RandomTokenProvider),
        );
        Self {
            visits: visits::VisitsService::new(Arc::new(repository.visits), resolver),
        }
    }
}
