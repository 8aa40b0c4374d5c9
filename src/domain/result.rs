//! Screening result types.

use serde::{Deserialize, Serialize};

/// Fixed disclaimer shown with every result.
pub const DISCLAIMER: &str = "This assessment is based on a machine learning model and is not a clinical diagnosis. \
Please consult a healthcare professional for proper evaluation and diagnosis.";

/// Interpretation of the predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    NoIndicatorsDetected,
    IndicatorsDetected,
}

impl Outcome {
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::IndicatorsDetected => "Indicators of ASD detected",
            Self::NoIndicatorsDetected => "No indicators of ASD detected",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.headline())
    }
}

/// Classifier output for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Predicted class (0 = no indicators, 1 = indicators detected)
    pub predicted_label: u8,

    /// Probability of class 1, in [0, 1]
    pub positive_probability: f64,
}

impl ScreeningResult {
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if self.predicted_label == 1 {
            Outcome::IndicatorsDetected
        } else {
            Outcome::NoIndicatorsDetected
        }
    }

    /// Probability of the predicted class.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.predicted_label == 1 {
            self.positive_probability
        } else {
            1.0 - self.positive_probability
        }
    }

    #[must_use]
    pub fn probability_percent(&self) -> f64 {
        self.positive_probability * 100.0
    }
}
