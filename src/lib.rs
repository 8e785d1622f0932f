//! PassHub server
//!
//! REST JSON API for event organizers who publish places, sell visitor
//! passes against a daily capacity, refund cancellations by a tiered policy,
//! and let security staff validate QR passes at the gate.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub repository: repository::Repository,
}
