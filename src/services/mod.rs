//! Business logic services

pub mod gateway;
pub mod passes;
pub mod payments;
pub mod places;
pub mod security;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub places: places::PlacesService,
    pub passes: passes::PassesService,
    pub payments: payments::PaymentsService,
    pub security: security::SecurityService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let gateway = gateway::from_name(&config.payments.gateway)?;
        tracing::info!(gateway = gateway.name(), "Payment gateway ready");

        Ok(Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            places: places::PlacesService::new(repository.clone(), config.booking.clone()),
            passes: passes::PassesService::new(repository.clone(), config.booking.clone(), gateway.clone()),
            payments: payments::PaymentsService::new(repository.clone(), gateway),
            security: security::SecurityService::new(repository, config.booking.clone()),
        })
    }
}
