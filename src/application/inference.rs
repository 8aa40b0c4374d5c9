//! Inference adapter: runs the classifier on one encoded response.
//!
//! The classifier is called with a single-row batch through both entry
//! points. Its output is checked before it becomes a `ScreeningResult`; a
//! misbehaving model yields an `InferenceError`, never a panic.

use crate::domain::{FeatureVector, ScreeningResult};
use crate::ports::{Classifier, InferenceError};

/// Rows of `predict_proba` must sum to one within this tolerance.
const PROBA_SUM_TOLERANCE: f64 = 1e-6;

/// Score one feature vector.
///
/// # Errors
/// Returns `InferenceError` if the classifier fails or returns a malformed
/// label or probability row.
pub fn run_inference<C>(
    classifier: &C,
    features: &FeatureVector,
) -> Result<ScreeningResult, InferenceError>
where
    C: Classifier + ?Sized,
{
    let rows = std::slice::from_ref(features);

    let labels = classifier.predict(rows)?;
    let label = single_row(labels)?;
    if label > 1 {
        return Err(InferenceError::InvalidOutput(format!(
            "label {label} is not a binary class"
        )));
    }

    let probas = classifier.predict_proba(rows)?;
    let [p0, p1] = single_row(probas)?;
    if !(p0.is_finite() && p1.is_finite()) {
        return Err(InferenceError::InvalidOutput("non-finite probability".into()));
    }
    if !(0.0..=1.0).contains(&p0) || !(0.0..=1.0).contains(&p1) {
        return Err(InferenceError::InvalidOutput(format!(
            "probability outside [0, 1]: [{p0}, {p1}]"
        )));
    }
    if ((p0 + p1) - 1.0).abs() > PROBA_SUM_TOLERANCE {
        return Err(InferenceError::InvalidOutput(format!(
            "probabilities sum to {}",
            p0 + p1
        )));
    }

    tracing::debug!(label, "Inference complete");

    Ok(ScreeningResult {
        predicted_label: label,
        positive_probability: p1,
    })
}

fn single_row<T>(mut rows: Vec<T>) -> Result<T, InferenceError> {
    if rows.len() != 1 {
        return Err(InferenceError::RowCountMismatch {
            expected: 1,
            got: rows.len(),
        });
    }
    rows.pop()
        .ok_or(InferenceError::RowCountMismatch { expected: 1, got: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_COUNT;

    /// Classifier returning canned output.
    struct Canned {
        labels: Vec<u8>,
        probas: Vec<[f64; 2]>,
    }

    impl Classifier for Canned {
        fn predict(&self, _rows: &[FeatureVector]) -> Result<Vec<u8>, InferenceError> {
            Ok(self.labels.clone())
        }

        fn predict_proba(&self, _rows: &[FeatureVector]) -> Result<Vec<[f64; 2]>, InferenceError> {
            Ok(self.probas.clone())
        }

        fn describe(&self) -> String {
            "canned".into()
        }
    }

    fn canned(labels: Vec<u8>, probas: Vec<[f64; 2]>) -> Canned {
        Canned { labels, probas }
    }

    fn vector() -> FeatureVector {
        FeatureVector::from_array([0.0; FEATURE_COUNT])
    }

    #[test]
    fn test_extracts_positive_probability() {
        let result = run_inference(&canned(vec![1], vec![[0.25, 0.75]]), &vector())
            .expect("inference");
        assert_eq!(result.predicted_label, 1);
        assert!((result.positive_probability - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        let err = run_inference(&canned(vec![0, 1], vec![[1.0, 0.0]]), &vector())
            .expect_err("two labels");
        assert_eq!(err, InferenceError::RowCountMismatch { expected: 1, got: 2 });

        let err = run_inference(&canned(vec![0], vec![]), &vector()).expect_err("no rows");
        assert_eq!(err, InferenceError::RowCountMismatch { expected: 1, got: 0 });
    }

    #[test]
    fn test_rejects_bad_outputs() {
        for model in [
            canned(vec![2], vec![[0.5, 0.5]]),
            canned(vec![0], vec![[f64::NAN, 0.5]]),
            canned(vec![0], vec![[1.2, -0.2]]),
            canned(vec![0], vec![[0.3, 0.3]]),
        ] {
            let err = run_inference(&model, &vector()).expect_err("invalid output");
            assert!(matches!(err, InferenceError::InvalidOutput(_)), "{err:?}");
        }
    }

    #[test]
    fn test_propagates_classifier_error() {
        struct Broken;
        impl Classifier for Broken {
            fn predict(&self, _: &[FeatureVector]) -> Result<Vec<u8>, InferenceError> {
                Err(InferenceError::ModelNotLoaded)
            }
            fn predict_proba(&self, _: &[FeatureVector]) -> Result<Vec<[f64; 2]>, InferenceError> {
                Err(InferenceError::ModelNotLoaded)
            }
            fn describe(&self) -> String {
                "broken".into()
            }
        }

        assert_eq!(
            run_inference(&Broken, &vector()),
            Err(InferenceError::ModelNotLoaded)
        );
    }
}
