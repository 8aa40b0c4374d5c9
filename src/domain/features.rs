//! Feature encoding for the screening classifier.
//!
//! The classifier was fitted on a fixed column order. A vector in any other
//! order still produces a prediction, just a meaningless one, so the order is
//! defined exactly once here (`FEATURE_NAMES`) and only `encode_features`
//! builds vectors.

use super::encoder::{CategoricalEncoders, EncodeError};
use super::response::{RawResponse, QUESTION_COUNT};

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 19;

/// Column names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "A1_Score",
    "A2_Score",
    "A3_Score",
    "A4_Score",
    "A5_Score",
    "A6_Score",
    "A7_Score",
    "A8_Score",
    "A9_Score",
    "A10_Score",
    "age",
    "gender",
    "ethnicity",
    "jaundice",
    "austim",
    "contry_of_res",
    "used_app_before",
    "result",
    "relation",
];

/// Column positions, named so callers never index by magic number.
pub mod column {
    pub const FIRST_ANSWER: usize = 0;
    pub const AGE: usize = 10;
    pub const GENDER_IS_MALE: usize = 11;
    pub const ETHNICITY: usize = 12;
    pub const JAUNDICE: usize = 13;
    pub const FAMILY_AUTISM_HISTORY: usize = 14;
    pub const COUNTRY: usize = 15;
    pub const USED_APP_BEFORE: usize = 16;
    pub const BEHAVIORAL_SCORE: usize = 17;
    pub const RELATION: usize = 18;
}

/// One encoded submission in model input order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap raw values that are already in model order.
    ///
    /// Only meant for adapters and tests that replay stored vectors; new
    /// submissions go through `encode_features`.
    #[must_use]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, column: usize) -> Option<f64> {
        self.0.get(column).copied()
    }

    #[must_use]
    pub fn behavioral_score(&self) -> f64 {
        self.0[column::BEHAVIORAL_SCORE]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Encode a response into the model's feature vector.
///
/// Yes/No fields become 1/0, gender becomes 1 for Male and 0 otherwise, and
/// categorical fields are looked up in their encoders. The ten-item sum is
/// included as its own column because the model was trained with it.
///
/// # Errors
/// Returns `EncodeError::UnknownCategory` if country, ethnicity or relation is
/// not in its encoder's known set. No partial vector is produced.
pub fn encode_features(
    response: &RawResponse,
    encoders: &CategoricalEncoders,
) -> Result<FeatureVector, EncodeError> {
    let ethnicity = encoders.ethnicity.encode(&response.ethnicity)?;
    let country = encoders.country.encode(&response.country)?;
    let relation = encoders.relation.encode(&response.relation)?;

    let mut v = [0.0; FEATURE_COUNT];
    for (i, answer) in response.answers.iter().enumerate() {
        v[column::FIRST_ANSWER + i] = f64::from(answer.as_bit());
    }
    v[column::AGE] = f64::from(response.age);
    v[column::GENDER_IS_MALE] = f64::from(response.gender.is_male_bit());
    v[column::ETHNICITY] = ethnicity as f64;
    v[column::JAUNDICE] = f64::from(response.jaundice_history.as_bit());
    v[column::FAMILY_AUTISM_HISTORY] = f64::from(response.family_autism_history.as_bit());
    v[column::COUNTRY] = country as f64;
    v[column::USED_APP_BEFORE] = f64::from(response.used_app_before.as_bit());
    v[column::BEHAVIORAL_SCORE] = f64::from(response.behavioral_score());
    v[column::RELATION] = relation as f64;

    Ok(FeatureVector(v))
}

// The answer block must end right where the demographics start.
const _: () = assert!(column::FIRST_ANSWER + QUESTION_COUNT == column::AGE);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encoder::{CategoricalEncoder, CategoricalField};
    use crate::domain::response::{Answer, Gender};

    fn encoders() -> CategoricalEncoders {
        let build = |field, items: &[&str]| {
            CategoricalEncoder::from_classes(field, items.iter().map(|s| s.to_string()).collect())
                .expect("valid encoder")
        };
        CategoricalEncoders {
            country: build(
                CategoricalField::Country,
                &["Afghanistan", "Brazil", "India", "United States"],
            ),
            ethnicity: build(
                CategoricalField::Ethnicity,
                &["Asian", "Black", "Hispanic", "White-European"],
            ),
            relation: build(
                CategoricalField::Relation,
                &["Health care professional", "Others", "Parent", "Relative", "Self"],
            ),
        }
    }

    fn response(answers: [Answer; QUESTION_COUNT]) -> RawResponse {
        RawResponse {
            answers,
            age: 25,
            gender: Gender::Male,
            jaundice_history: Answer::No,
            family_autism_history: Answer::No,
            country: "Brazil".into(),
            ethnicity: "Asian".into(),
            used_app_before: Answer::No,
            relation: "Self".into(),
        }
    }

    #[test]
    fn test_all_yes_answers() {
        let v = encode_features(&response([Answer::Yes; QUESTION_COUNT]), &encoders())
            .expect("encode");
        assert!(v.as_slice()[..QUESTION_COUNT].iter().all(|&x| x == 1.0));
        assert_eq!(v.behavioral_score(), 10.0);
    }

    #[test]
    fn test_all_no_answers() {
        let v = encode_features(&response([Answer::No; QUESTION_COUNT]), &encoders())
            .expect("encode");
        assert!(v.as_slice()[..QUESTION_COUNT].iter().all(|&x| x == 0.0));
        assert_eq!(v.behavioral_score(), 0.0);
    }

    #[test]
    fn test_alternating_answers_full_vector() {
        use Answer::{No, Yes};
        let r = response([Yes, No, Yes, No, Yes, No, Yes, No, Yes, No]);
        let v = encode_features(&r, &encoders()).expect("encode");

        let expected = [
            1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, // a1..a10
            25.0, // age
            1.0,  // gender_is_male
            0.0,  // ethnicity "Asian"
            0.0,  // jaundice
            0.0,  // family history
            1.0,  // country "Brazil"
            0.0,  // used app before
            5.0,  // behavioral score
            4.0,  // relation "Self"
        ];
        assert_eq!(v.as_slice(), &expected);
        assert_eq!(v.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_demographic_columns() {
        let mut r = response([Answer::No; QUESTION_COUNT]);
        r.age = 61;
        r.jaundice_history = Answer::Yes;
        r.used_app_before = Answer::Yes;
        r.country = "United States".into();
        r.ethnicity = "White-European".into();
        r.relation = "Parent".into();

        let v = encode_features(&r, &encoders()).expect("encode");
        assert_eq!(v.get(column::AGE), Some(61.0));
        assert_eq!(v.get(column::JAUNDICE), Some(1.0));
        assert_eq!(v.get(column::FAMILY_AUTISM_HISTORY), Some(0.0));
        assert_eq!(v.get(column::USED_APP_BEFORE), Some(1.0));
        assert_eq!(v.get(column::COUNTRY), Some(3.0));
        assert_eq!(v.get(column::ETHNICITY), Some(3.0));
        assert_eq!(v.get(column::RELATION), Some(2.0));
    }

    #[test]
    fn test_gender_encoding() {
        let enc = encoders();
        for (gender, expected) in [
            (Gender::Male, 1.0),
            (Gender::Female, 0.0),
            (Gender::Other, 0.0),
        ] {
            let mut r = response([Answer::No; QUESTION_COUNT]);
            r.gender = gender;
            let v = encode_features(&r, &enc).expect("encode");
            assert_eq!(v.get(column::GENDER_IS_MALE), Some(expected), "{gender}");
        }
    }

    #[test]
    fn test_unknown_categories_produce_no_vector() {
        let enc = encoders();

        let mut r = response([Answer::Yes; QUESTION_COUNT]);
        r.country = "Atlantis".into();
        assert!(matches!(
            encode_features(&r, &enc),
            Err(EncodeError::UnknownCategory { field: CategoricalField::Country, .. })
        ));

        let mut r = response([Answer::Yes; QUESTION_COUNT]);
        r.ethnicity = "Martian".into();
        assert!(matches!(
            encode_features(&r, &enc),
            Err(EncodeError::UnknownCategory { field: CategoricalField::Ethnicity, .. })
        ));

        let mut r = response([Answer::Yes; QUESTION_COUNT]);
        r.relation = "Neighbour".into();
        assert!(matches!(
            encode_features(&r, &enc),
            Err(EncodeError::UnknownCategory { field: CategoricalField::Relation, .. })
        ));
    }

    #[test]
    fn test_feature_names_match_columns() {
        assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);
        assert_eq!(FEATURE_NAMES[column::AGE], "age");
        assert_eq!(FEATURE_NAMES[column::BEHAVIORAL_SCORE], "result");
        assert_eq!(FEATURE_NAMES[column::RELATION], "relation");
    }
}
