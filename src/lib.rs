//! Presença - Congregation Visit Analytics
//!
//! A small REST service that records at most one visit per identity per day
//! for a church community web application and serves per-day aggregates
//! (total and per-role) to staff.

use sqlx::{Pool, Postgres};
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
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
