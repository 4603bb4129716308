//! # AppError
//!
//! Centralized error handling for the Yatube services.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::forms::FieldErrors;

/// The primary error type for all yt-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Group, User, Post, Follow)
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// Form input rejected; carries a message per offending field
    #[error("validation error: {0}")]
    Validation(FieldErrors),

    /// Bad credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        AppError::NotFound(kind, key.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Yatube logic.
pub type Result<T> = std::result::Result<T, AppError>;
