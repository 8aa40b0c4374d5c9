//! Artifact loader: reads the exported model and categorical encoders.
//!
//! # Layout
//!
//! ```text
//! models/
//!   model.json       exported classifier (see `adapters::model`)
//!   encoders.json    label sets for country, ethnicity, relation
//!   manifest.json    optional, SHA-256 of each bound file
//!   artifacts.sig    optional, Ed25519 signature over manifest.json
//! ```
//!
//! # Integrity
//!
//! - If `manifest.json` exists, every file it lists must match its digest and
//!   it must bind both `model.json` and `encoders.json`.
//! - If `artifacts.sig` exists, it must verify against the trusted key.
//! - With `require_signature`, both files are mandatory.
//!
//! Anything else fails the load; the caller then refuses submissions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::model::{ExportedModel, ModelError};
use crate::domain::{CategoricalEncoder, CategoricalEncoders, CategoricalField, EncoderBuildError};

pub const MODEL_FILE: &str = "model.json";
pub const ENCODERS_FILE: &str = "encoders.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";

/// Files every manifest must bind.
pub const BOUND_FILES: [&str; 2] = [MODEL_FILE, ENCODERS_FILE];

/// Allowed clock skew for manifest timestamps.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Errors raised while loading artifacts at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("Artifact directory not found: {0:?}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid encoder artifact: {0}")]
    Encoders(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("File hash mismatch for {0}")]
    DigestMismatch(String),

    #[error("Signature check failed: {0}")]
    Signature(String),
}

impl From<EncoderBuildError> for ArtifactLoadError {
    fn from(e: EncoderBuildError) -> Self {
        Self::Encoders(e.to_string())
    }
}

/// Signature policy for artifact loading.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPolicy {
    /// Refuse artifacts without a signed manifest
    pub require_signature: bool,

    /// Key that signed the manifest
    pub trusted_key: Option<VerifyingKey>,
}

/// Signed manifest binding artifact files by digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    #[serde(default)]
    pub serial: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// One encoder as written by the training notebook: either the ordered class
/// list (`LabelEncoder.classes_`) or an explicit label to code map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EncoderSpec {
    Classes(Vec<String>),
    Codes(CodePairs),
}

/// Label to code entries in file order. Repeated keys are kept so the
/// encoder builder can reject them.
#[derive(Debug, Clone)]
struct CodePairs(Vec<(String, i64)>);

impl<'de> Deserialize<'de> for CodePairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = CodePairs;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of label to integer code")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CodePairs, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, code)) = map.next_entry::<String, i64>()? {
                    pairs.push((label, code));
                }
                Ok(CodePairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct EncodersFile {
    #[serde(alias = "contry_of_res")]
    country: EncoderSpec,
    ethnicity: EncoderSpec,
    relation: EncoderSpec,
}

impl EncoderSpec {
    fn build(self, field: CategoricalField) -> Result<CategoricalEncoder, EncoderBuildError> {
        match self {
            Self::Classes(classes) => CategoricalEncoder::from_classes(field, classes),
            Self::Codes(CodePairs(pairs)) => CategoricalEncoder::from_pairs(field, pairs),
        }
    }
}

/// Everything loaded at startup. Read-only afterwards.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub model: ExportedModel,
    pub encoders: CategoricalEncoders,
    /// Manifest serial, when the artifacts were signed
    pub serial: Option<u64>,
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    fs::read(path).map_err(|source| ArtifactLoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns `ArtifactLoadError::Signature` for bad base64 or key bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactLoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactLoadError::Signature("Invalid public key base64".into()))?;
    let raw: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactLoadError::Signature("Invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&raw)
        .map_err(|_| ArtifactLoadError::Signature("Invalid verifying key".into()))
}

/// Parse `encoders.json`.
///
/// # Errors
/// Returns `ArtifactLoadError::Encoders` for malformed or invalid encoders.
pub fn parse_encoders(bytes: &[u8]) -> Result<CategoricalEncoders, ArtifactLoadError> {
    let file: EncodersFile =
        serde_json::from_slice(bytes).map_err(|e| ArtifactLoadError::Encoders(e.to_string()))?;
    Ok(CategoricalEncoders {
        country: file.country.build(CategoricalField::Country)?,
        ethnicity: file.ethnicity.build(CategoricalField::Ethnicity)?,
        relation: file.relation.build(CategoricalField::Relation)?,
    })
}

/// Load and validate the artifacts in `dir`.
///
/// # Errors
/// Returns `ArtifactLoadError` if any file is missing, corrupt, or fails the
/// integrity policy.
pub fn load_artifacts(dir: &Path, policy: &ArtifactPolicy) -> Result<Artifacts, ArtifactLoadError> {
    if !dir.is_dir() {
        return Err(ArtifactLoadError::MissingDirectory(dir.to_path_buf()));
    }

    let manifest = verify_manifest(dir, policy)?;

    let model_bytes = read_file(&dir.join(MODEL_FILE))?;
    let encoder_bytes = read_file(&dir.join(ENCODERS_FILE))?;

    // Re-check digests against the bytes actually parsed.
    if let Some(manifest) = &manifest {
        for (name, bytes) in [(MODEL_FILE, &model_bytes), (ENCODERS_FILE, &encoder_bytes)] {
            let expected = manifest.files.get(name).map(String::as_str).unwrap_or("");
            if !constant_time_eq_str(&sha256_hex(bytes), expected) {
                return Err(ArtifactLoadError::DigestMismatch(name.to_string()));
            }
        }
    }

    let model = ExportedModel::from_json(&model_bytes)?;
    let encoders = parse_encoders(&encoder_bytes)?;

    tracing::info!(
        "Loaded artifacts from {:?}: {} | {} countries, {} ethnicities, {} relations",
        dir,
        crate::ports::Classifier::describe(&model),
        encoders.country.len(),
        encoders.ethnicity.len(),
        encoders.relation.len()
    );

    Ok(Artifacts {
        model,
        encoders,
        serial: manifest.and_then(|m| m.serial),
    })
}

/// Write `manifest.json` binding the artifact files in `dir`, and sign it
/// into `artifacts.sig`.
///
/// # Errors
/// Returns `ArtifactLoadError` if a bound file cannot be read or the output
/// cannot be written.
pub fn write_signed_manifest(
    dir: &Path,
    key: &SigningKey,
    serial: u64,
) -> Result<ArtifactManifest, ArtifactLoadError> {
    let mut files = BTreeMap::new();
    for name in BOUND_FILES {
        let bytes = read_file(&dir.join(name))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let manifest = ArtifactManifest {
        version: 1,
        serial: Some(serial),
        created_at: Some(unix_now()),
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| ArtifactLoadError::Manifest(e.to_string()))?;

    let write = |name: &str, bytes: &[u8]| {
        let path = dir.join(name);
        fs::write(&path, bytes).map_err(|source| ArtifactLoadError::Write { path, source })
    };
    write(MANIFEST_FILE, &manifest_bytes)?;
    let sig: Signature = key.sign(&manifest_bytes);
    write(SIGNATURE_FILE, &sig.to_bytes())?;

    tracing::info!("Signed {} files in {:?} (serial {})", BOUND_FILES.len(), dir, serial);
    Ok(manifest)
}

/// Check the manifest and signature, if present.
///
/// Returns `None` when the directory carries no manifest and the policy
/// allows that.
fn verify_manifest(
    dir: &Path,
    policy: &ArtifactPolicy,
) -> Result<Option<ArtifactManifest>, ArtifactLoadError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let sig_path = dir.join(SIGNATURE_FILE);

    match (manifest_path.exists(), sig_path.exists()) {
        (false, false) => {
            if policy.require_signature {
                tracing::error!("Signed manifest required but not found in {:?}", dir);
                return Err(ArtifactLoadError::Signature(format!(
                    "{MANIFEST_FILE} and {SIGNATURE_FILE} are required"
                )));
            }
            tracing::warn!("Loading UNSIGNED artifacts from {:?}", dir);
            return Ok(None);
        }
        (false, true) => {
            return Err(ArtifactLoadError::Manifest(format!(
                "{SIGNATURE_FILE} present without {MANIFEST_FILE}"
            )));
        }
        (true, false) if policy.require_signature => {
            return Err(ArtifactLoadError::Signature(format!("{SIGNATURE_FILE} is required")));
        }
        _ => {}
    }

    let manifest_bytes = read_file(&manifest_path)?;

    if sig_path.exists() {
        let key = policy.trusted_key.as_ref().ok_or_else(|| {
            ArtifactLoadError::Signature("artifacts are signed but no trusted key is configured".into())
        })?;
        let sig_bytes = read_file(&sig_path)?;
        let sig: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
            ArtifactLoadError::Signature("Invalid signature length (expected 64 bytes)".into())
        })?;
        key.verify(&manifest_bytes, &Signature::from_bytes(&sig))
            .map_err(|_| ArtifactLoadError::Signature("Invalid artifact signature".into()))?;
        tracing::info!("Artifact signature verified");
    } else {
        tracing::warn!("{MANIFEST_FILE} is not signed; checking digests only");
    }

    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ArtifactLoadError::Manifest(format!("invalid format: {e}")))?;

    if manifest.version != 1 {
        return Err(ArtifactLoadError::Manifest(format!(
            "unsupported version {}",
            manifest.version
        )));
    }
    if let Some(created_at) = manifest.created_at {
        if created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
            return Err(ArtifactLoadError::Manifest("created_at is in the future".into()));
        }
    }
    for required in BOUND_FILES {
        if !manifest.files.contains_key(required) {
            return Err(ArtifactLoadError::Manifest(format!("does not bind {required}")));
        }
    }

    for (rel, expected_hex) in &manifest.files {
        // Only plain file names; the manifest must not reach outside the directory.
        if rel.contains('/') || rel.contains('\\') || rel == ".." {
            return Err(ArtifactLoadError::Manifest(format!("invalid file name {rel:?}")));
        }
        let bytes = read_file(&dir.join(rel))?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ArtifactLoadError::DigestMismatch(rel.clone()));
        }
    }

    Ok(Some(manifest))
}
