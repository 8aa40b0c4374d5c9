//! Questionnaire response types.
//!
//! Based on the AQ-10 adult screening items plus the demographic fields the
//! classifier was trained with.

use serde::{Deserialize, Serialize};

/// Number of behavioral questions (AQ-10 items).
pub const QUESTION_COUNT: usize = 10;

/// Inclusive age range accepted by the form.
pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 1..=100;

/// Question text shown for each item, in item order.
pub const QUESTIONS: [&str; QUESTION_COUNT] = [
    "I often notice small sounds when others do not",
    "I usually concentrate more on the whole picture",
    "I find it easy to do more than one thing at once",
    "I can switch back to what I was doing very quickly",
    "I find it easy to 'read between the lines'",
    "I know how to tell if someone is bored",
    "I find it difficult to work out characters' intentions",
    "I like to collect information",
    "I find it easy to understand feelings",
    "I find it difficult to work out intentions",
];

/// A Yes/No answer.
///
/// Deserializes from any string through [`Answer::from_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Answer {
    Yes,
    #[default]
    No,
}

impl Answer {
    /// Parse a form label. Only an exact `"Yes"` counts as yes; everything
    /// else is treated as no.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "Yes" {
            Self::Yes
        } else {
            Self::No
        }
    }

    /// Binary feature value (Yes = 1, No = 0).
    #[must_use]
    pub fn as_bit(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl From<String> for Answer {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// Gender as offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    /// The trained model only distinguishes male from not-male, so Female and
    /// Other share code 0.
    #[must_use]
    pub fn is_male_bit(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female | Self::Other => 0,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// One questionnaire submission, as entered by the user.
///
/// Built fresh for every submission and dropped after inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Answers to items 1..=10, in item order
    pub answers: [Answer; QUESTION_COUNT],

    /// Age in years (1-100)
    pub age: u8,

    pub gender: Gender,

    /// Born with jaundice
    pub jaundice_history: Answer,

    /// Family member diagnosed with autism
    pub family_autism_history: Answer,

    /// Country of residence, must be known to the country encoder
    pub country: String,

    /// Must be known to the ethnicity encoder
    pub ethnicity: String,

    pub used_app_before: Answer,

    /// Who is completing the test, must be known to the relation encoder
    pub relation: String,
}

impl RawResponse {
    /// Sum of the ten binary answers (0-10).
    #[must_use]
    pub fn behavioral_score(&self) -> u8 {
        self.answers.iter().map(|a| a.as_bit()).sum()
    }

    /// Validate field ranges.
    ///
    /// Categorical membership is checked later by the encoders.
    ///
    /// # Errors
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(format!(
                "Age {} out of range [{}, {}]",
                self.age,
                AGE_RANGE.start(),
                AGE_RANGE.end()
            ));
        }
        for (name, value) in [
            ("Country", &self.country),
            ("Ethnicity", &self.ethnicity),
            ("Relation", &self.relation),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{name} must be selected"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
