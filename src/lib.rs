//! # aqscreen
//!
//! AQ-10 autism screening questionnaire backed by a pre-trained binary
//! classifier.
//!
//! This crate provides:
//! - Deterministic encoding of questionnaire answers into the model's
//!   feature schema
//! - Loading and integrity checks for the exported model and encoders
//! - A terminal UI and a headless JSON mode
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (RawResponse, FeatureVector, encoders, results)
//! - `ports`: The `Classifier` trait
//! - `adapters`: Exported-model classifier, artifact loader, log sanitizer
//! - `application`: Inference adapter and screening service
//! - `tui`: Terminal user interface
//!
//! The result is a screening aid, not a clinical diagnosis.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::{ScreeningService, SessionState};
pub use config::AppConfig;
pub use domain::{FeatureVector, RawResponse, ScreeningResult};

/// Result type for screening operations
pub type Result<T> = std::result::Result<T, ScreeningError>;

/// Main error type for aqscreen
#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error("Artifact load failed: {0}")]
    ArtifactLoad(#[from] adapters::ArtifactLoadError),

    #[error("{0}")]
    Encode(#[from] domain::EncodeError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("Invalid response: {0}")]
    Validation(String),

    #[error("Screening unavailable: {0}")]
    NotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
