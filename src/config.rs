//! Runtime configuration from `AQSCREEN_*` environment variables.

use std::path::PathBuf;

use crate::adapters::artifacts::{verifying_key_from_b64, ArtifactLoadError, ArtifactPolicy};

pub const DEFAULT_MODEL_PATH: &str = "models";
pub const DEFAULT_LOG_FILE: &str = "aqscreen.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal, console otherwise
    #[default]
    Auto,
    File,
    /// stderr, so headless JSON on stdout stays clean
    Console,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" | "stderr" | "console" => Self::Console,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Console => false,
            Self::Auto => interactive,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding `model.json` and `encoders.json`
    pub model_dir: PathBuf,
    /// Refuse unsigned artifacts
    pub require_signature: bool,
    /// File containing the trusted Ed25519 public key (base64)
    pub trusted_key_file: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_PATH),
            require_signature: false,
            trusted_key_file: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            model_dir: non_empty("AQSCREEN_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            require_signature: non_empty("AQSCREEN_REQUIRE_SIGNED_ARTIFACTS")
                .is_some_and(|v| parse_bool(&v)),
            trusted_key_file: non_empty("AQSCREEN_SIGNING_PUBKEY_B64_FILE").map(PathBuf::from),
            log_mode: non_empty("AQSCREEN_LOG_MODE")
                .map(|v| LogMode::parse(&v))
                .unwrap_or_default(),
            log_file: non_empty("AQSCREEN_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }

    /// Build the artifact signature policy, reading the trusted key if one
    /// is configured.
    ///
    /// # Errors
    /// Returns `ArtifactLoadError` if the key file cannot be read or decoded.
    pub fn artifact_policy(&self) -> Result<ArtifactPolicy, ArtifactLoadError> {
        let trusted_key = match &self.trusted_key_file {
            Some(path) => {
                let b64 = std::fs::read_to_string(path).map_err(|source| {
                    ArtifactLoadError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                Some(verifying_key_from_b64(&b64)?)
            }
            None => None,
        };

        Ok(ArtifactPolicy {
            require_signature: self.require_signature,
            trusted_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert!(!config.require_signature);
    }

    #[test]
    fn test_reads_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("AQSCREEN_MODEL_PATH", "/srv/aq"),
            ("AQSCREEN_REQUIRE_SIGNED_ARTIFACTS", "yes"),
            ("AQSCREEN_SIGNING_PUBKEY_B64_FILE", "/srv/aq/key.pub"),
            ("AQSCREEN_LOG_MODE", "Stdout"),
            ("AQSCREEN_LOG_FILE", "/tmp/aq.log"),
        ]));
        assert_eq!(config.model_dir, PathBuf::from("/srv/aq"));
        assert!(config.require_signature);
        assert_eq!(config.trusted_key_file, Some(PathBuf::from("/srv/aq/key.pub")));
        assert_eq!(config.log_mode, LogMode::Console);
        assert_eq!(config.log_file, PathBuf::from("/tmp/aq.log"));
    }

    #[test]
    fn test_bool_and_blank_values() {
        for (value, expected) in [("1", true), ("TRUE", true), ("no", false), ("on", false)] {
            let config = AppConfig::from_lookup(lookup_from(&[(
                "AQSCREEN_REQUIRE_SIGNED_ARTIFACTS",
                value,
            )]));
            assert_eq!(config.require_signature, expected, "value {value:?}");
        }

        let config = AppConfig::from_lookup(lookup_from(&[("AQSCREEN_MODEL_PATH", "  ")]));
        assert_eq!(config.model_dir, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Console.use_file(true));
        assert_eq!(LogMode::parse("garbage"), LogMode::Auto);
    }

    #[test]
    fn test_artifact_policy_reads_key() {
        let temp = tempfile::tempdir().expect("tempdir");
        let key = ed25519_dalek::SigningKey::from_bytes(&[3u8; 32]);
        let path = temp.path().join("key.pub");
        std::fs::write(
            &path,
            base64::engine::general_purpose::STANDARD.encode(key.verifying_key().as_bytes()),
        )
        .expect("write key");

        let config = AppConfig {
            trusted_key_file: Some(path),
            require_signature: true,
            ..AppConfig::default()
        };
        let policy = config.artifact_policy().expect("policy");
        assert!(policy.require_signature);
        assert_eq!(policy.trusted_key, Some(key.verifying_key()));

        let missing = AppConfig {
            trusted_key_file: Some(temp.path().join("absent")),
            ..AppConfig::default()
        };
        assert!(missing.artifact_policy().is_err());
    }
}
