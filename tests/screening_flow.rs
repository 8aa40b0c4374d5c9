//! End-to-end screening against the artifacts shipped in `models/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aqscreen::adapters::artifacts::{
    load_artifacts, write_signed_manifest, ArtifactLoadError, ArtifactPolicy, ENCODERS_FILE,
    MODEL_FILE,
};
use aqscreen::application::{ScreeningService, SessionState};
use aqscreen::domain::{encode_features, Answer, Gender, FEATURE_COUNT};
use aqscreen::ports::Classifier;
use aqscreen::{AppConfig, RawResponse, ScreeningError};

fn shipped_models() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
}

fn config_for(dir: &Path) -> AppConfig {
    AppConfig {
        model_dir: dir.to_path_buf(),
        ..AppConfig::default()
    }
}

fn alternating_response() -> RawResponse {
    RawResponse {
        answers: std::array::from_fn(|i| Answer::from(i % 2 == 0)),
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
fn test_alternating_answers_end_to_end() {
    let artifacts =
        load_artifacts(&shipped_models(), &ArtifactPolicy::default()).expect("shipped artifacts");

    let features =
        encode_features(&alternating_response(), &artifacts.encoders).expect("encode response");
    assert_eq!(features.len(), FEATURE_COUNT);

    let eth = artifacts.encoders.ethnicity.encode("Asian").expect("Asian") as f64;
    let country = artifacts.encoders.country.encode("Brazil").expect("Brazil") as f64;
    let rel = artifacts.encoders.relation.encode("Self").expect("Self") as f64;
    assert_eq!(
        features.as_slice(),
        &[
            1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 25.0, 1.0, eth, 0.0, 0.0, country,
            0.0, 5.0, rel
        ]
    );

    let service = ScreeningService::ready(Arc::new(artifacts.model), Arc::new(artifacts.encoders));
    let first = service.submit(&alternating_response()).expect("first submit");
    let second = service.submit(&alternating_response()).expect("second submit");
    assert_eq!(first, second);

    // decision = 0.35*5 + 0.55*5 - 0.005*25 - 5.2 = -0.825
    assert_eq!(first.predicted_label, 0);
    let expected = 1.0 / (1.0 + 0.825_f64.exp());
    assert!((first.positive_probability - expected).abs() < 1e-9);
}

#[test]
fn test_high_score_is_flagged() {
    let service = ScreeningService::load(&config_for(&shipped_models()));
    assert_eq!(service.state(), SessionState::Ready);

    let mut response = alternating_response();
    response.answers = [Answer::Yes; 10];
    let result = service.submit(&response).expect("submit");

    assert_eq!(result.predicted_label, 1);
    assert!(result.positive_probability > 0.5);
    assert!((result.confidence() - result.positive_probability).abs() < 1e-12);
}

#[test]
fn test_absent_model_fails_load_and_refuses_submissions() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::copy(
        shipped_models().join(ENCODERS_FILE),
        temp.path().join(ENCODERS_FILE),
    )
    .expect("copy encoders");

    let service = ScreeningService::load(&config_for(temp.path()));
    assert!(matches!(service.state(), SessionState::LoadFailed(_)));
    assert!(matches!(
        service.submit(&alternating_response()),
        Err(ScreeningError::NotReady(_))
    ));
}

#[test]
fn test_unknown_country_is_rejected() {
    let service = ScreeningService::load(&config_for(&shipped_models()));
    let mut response = alternating_response();
    response.country = "Atlantis".into();

    let err = service.submit(&response).expect_err("unknown country");
    assert!(matches!(err, ScreeningError::Encode(_)));
    assert!(err.to_string().contains("Atlantis"));
}

#[test]
fn test_signed_copy_of_shipped_artifacts() {
    let temp = tempfile::tempdir().expect("tempdir");
    for name in [MODEL_FILE, ENCODERS_FILE] {
        std::fs::copy(shipped_models().join(name), temp.path().join(name)).expect("copy");
    }
    let key = ed25519_dalek::SigningKey::from_bytes(&[11u8; 32]);
    write_signed_manifest(temp.path(), &key, 1).expect("sign");

    let policy = ArtifactPolicy {
        require_signature: true,
        trusted_key: Some(key.verifying_key()),
    };
    let artifacts = load_artifacts(temp.path(), &policy).expect("verified load");
    assert!(artifacts.model.describe().contains("logistic"));

    // A different trusted key refuses the same files.
    let other = ed25519_dalek::SigningKey::from_bytes(&[12u8; 32]);
    let policy = ArtifactPolicy {
        require_signature: true,
        trusted_key: Some(other.verifying_key()),
    };
    assert!(matches!(
        load_artifacts(temp.path(), &policy),
        Err(ArtifactLoadError::Signature(_))
    ));
}
