//! Services Layer
//!
//! Pure engine logic (focus, pace, leveling, estimation) and the
//! persistence orchestration around it. HTTP handlers stay thin and call
//! down into here.

pub mod achievement_service;
pub mod analytics_service;
pub mod estimator;
pub mod focus;
pub mod leveling;
pub mod pace;
pub mod session_service;
pub mod stats_service;

use std::fmt;

/// Error type for service operations
#[derive(Debug)]
pub enum ServiceError {
    Database(String),
    NotFound,
    InvalidState(String),
    Validation(String),
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::Database(e.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Database(msg) => write!(f, "Database error: {}", msg),
            ServiceError::NotFound => write!(f, "Resource not found"),
            ServiceError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}
