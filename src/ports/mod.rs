//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the exported model.

mod classifier;

pub use classifier::{Classifier, InferenceError};
