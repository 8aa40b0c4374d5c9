//! Adapters layer: Concrete implementations of ports.
//!
//! - `model`: JSON-exported classifier implementing `Classifier`
//! - `artifacts`: loading and integrity checks for the model and encoders
//! - `sanitize`: redaction of questionnaire data in logs

pub mod artifacts;
pub mod model;
pub mod sanitize;

pub use artifacts::{load_artifacts, ArtifactLoadError, ArtifactPolicy, Artifacts};
pub use model::{ExportedModel, ModelError};
