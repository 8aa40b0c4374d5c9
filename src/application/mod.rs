//! Application layer: Use cases and services.
//!
//! Orchestrates the domain encoder with the `Classifier` port to screen one
//! response at a time.

mod inference;
mod screening;

pub use inference::run_inference;
pub use screening::{global, init_global, ScreeningService, SessionState};
