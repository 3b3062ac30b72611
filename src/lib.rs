//! # Scorecast
//!
//! Student exam score prediction service.
//!
//! This crate provides:
//! - Feature engineering over student demographic and study-habit attributes
//! - Loading of pre-trained regression artifacts (preprocessor + three models)
//! - A scoring pipeline producing math, reading and writing scores
//! - A small HTTP surface serving the form and the JSON prediction endpoint
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (StudentAttributes, PredictionResult)
//! - `ports`: Trait definitions for the preprocessor and the regressors
//! - `adapters`: Concrete implementations (JSON artifact store)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum routes and error-to-response mapping

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use domain::{PerformanceLevel, PredictionResult, StudentAttributes};

/// Message returned for every prediction while the artifacts are unavailable.
pub const MODELS_UNAVAILABLE_MESSAGE: &str =
    "Models not loaded correctly. Please check server logs.";

/// Result type for Scorecast operations
pub type Result<T> = std::result::Result<T, ScorecastError>;

/// Main error type for Scorecast
#[derive(Debug, thiserror::Error)]
pub enum ScorecastError {
    #[error("{}", MODELS_UNAVAILABLE_MESSAGE)]
    ModelsUnavailable,

    #[error(transparent)]
    Validation(#[from] domain::AttributeError),

    #[error(transparent)]
    Model(#[from] ports::ModelError),
}

impl ScorecastError {
    /// Whether this error is caused by the server rather than the request.
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::ModelsUnavailable)
    }
}
