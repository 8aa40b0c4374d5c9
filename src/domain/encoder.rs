//! Categorical label encoders.
//!
//! Codes are fixed when the encoder artifact is produced alongside the model
//! and are never reassigned here.

use std::collections::HashMap;

/// The categorical fields of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Country,
    Ethnicity,
    Relation,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [Self::Country, Self::Ethnicity, Self::Relation];

    /// Key used in the encoder artifact.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Ethnicity => "ethnicity",
            Self::Relation => "relation",
        }
    }
}

impl std::fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors produced while encoding a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("Unknown {field} category: {label:?}")]
    UnknownCategory {
        field: CategoricalField,
        label: String,
    },
}

/// Errors produced while building an encoder from artifact data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncoderBuildError {
    #[error("{0} encoder has no labels")]
    Empty(CategoricalField),

    #[error("{field} encoder has a blank label")]
    BlankLabel { field: CategoricalField },

    #[error("{field} encoder lists {label:?} more than once")]
    DuplicateLabel {
        field: CategoricalField,
        label: String,
    },

    #[error("{field} encoder assigns code {code} to more than one label")]
    DuplicateCode { field: CategoricalField, code: i64 },
}

/// Label to integer code mapping for one categorical field.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    field: CategoricalField,
    /// Labels sorted by code, for populating pickers
    labels: Vec<String>,
    codes: HashMap<String, i64>,
}

impl CategoricalEncoder {
    /// Build from an ordered class list: the code of a label is its index.
    ///
    /// # Errors
    /// Fails on an empty list, blank labels, or duplicates.
    pub fn from_classes(
        field: CategoricalField,
        classes: Vec<String>,
    ) -> Result<Self, EncoderBuildError> {
        let pairs = classes
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label, i as i64))
            .collect();
        Self::from_pairs(field, pairs)
    }

    /// Build from explicit `(label, code)` pairs.
    ///
    /// # Errors
    /// Fails on an empty mapping, blank labels, or duplicate labels/codes.
    pub fn from_pairs(
        field: CategoricalField,
        mut pairs: Vec<(String, i64)>,
    ) -> Result<Self, EncoderBuildError> {
        if pairs.is_empty() {
            return Err(EncoderBuildError::Empty(field));
        }

        let mut codes = HashMap::with_capacity(pairs.len());
        let mut seen_codes = std::collections::HashSet::with_capacity(pairs.len());
        for (label, code) in &pairs {
            if label.trim().is_empty() {
                return Err(EncoderBuildError::BlankLabel { field });
            }
            if codes.insert(label.clone(), *code).is_some() {
                return Err(EncoderBuildError::DuplicateLabel {
                    field,
                    label: label.clone(),
                });
            }
            if !seen_codes.insert(*code) {
                return Err(EncoderBuildError::DuplicateCode { field, code: *code });
            }
        }

        pairs.sort_by_key(|(_, code)| *code);
        let labels = pairs.into_iter().map(|(label, _)| label).collect();

        Ok(Self {
            field,
            labels,
            codes,
        })
    }

    #[must_use]
    pub fn field(&self) -> CategoricalField {
        self.field
    }

    /// Look up the code for a label.
    ///
    /// # Errors
    /// Returns `EncodeError::UnknownCategory` for labels outside the known set.
    pub fn encode(&self, label: &str) -> Result<i64, EncodeError> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| EncodeError::UnknownCategory {
                field: self.field,
                label: label.to_string(),
            })
    }

    /// Known labels in code order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The three encoders the model was trained with.
#[derive(Debug, Clone)]
pub struct CategoricalEncoders {
    pub country: CategoricalEncoder,
    pub ethnicity: CategoricalEncoder,
    pub relation: CategoricalEncoder,
}

impl CategoricalEncoders {
    #[must_use]
    pub fn get(&self, field: CategoricalField) -> &CategoricalEncoder {
        match field {
            CategoricalField::Country => &self.country,
            CategoricalField::Ethnicity => &self.ethnicity,
            CategoricalField::Relation => &self.relation,
        }
    }
}
