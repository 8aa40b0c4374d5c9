//! Classifier port: Trait for the pre-fit binary classifier.
//!
//! This trait abstracts the exported model from the application logic. The
//! surface mirrors what the model was trained to offer: a class prediction
//! and class probabilities, both over a batch of rows.

use crate::domain::FeatureVector;

/// Errors raised while running the classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Malformed feature vector: {0}")]
    MalformedInput(String),

    #[error("Classifier returned {got} rows for a batch of {expected}")]
    RowCountMismatch { expected: usize, got: usize },

    #[error("Classifier returned invalid output: {0}")]
    InvalidOutput(String),
}

/// Trait for binary classifiers.
///
/// Implementations must be deterministic: the same rows always give the same
/// labels and probabilities. They are shared read-only across the process.
pub trait Classifier: Send + Sync {
    /// Predict the class label (0 or 1) of each row.
    ///
    /// # Errors
    /// Returns `InferenceError` if the rows cannot be scored.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, InferenceError>;

    /// Predict `[P(class 0), P(class 1)]` for each row.
    ///
    /// # Errors
    /// Returns `InferenceError` if the rows cannot be scored.
    fn predict_proba(&self, rows: &[FeatureVector]) -> Result<Vec<[f64; 2]>, InferenceError>;

    /// Short human-readable description for status display and logs.
    fn describe(&self) -> String;
}
