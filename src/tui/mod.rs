//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Home with model status (and a banner when loading failed)
//! - The AQ-10 questionnaire
//! - The screening result

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
