//! Screening service: Session state and the submission pipeline.
//!
//! Artifacts are loaded once per process. A failed load is terminal for the
//! session: the service stays in `LoadFailed` and declines every submission
//! before any encoding or inference happens.

use std::sync::{Arc, OnceLock};

use crate::adapters::{load_artifacts, ExportedModel};
use crate::application::inference::run_inference;
use crate::config::AppConfig;
use crate::domain::{encode_features, CategoricalEncoders, CategoricalField, RawResponse, ScreeningResult};
use crate::ports::Classifier;
use crate::ScreeningError;

static GLOBAL: OnceLock<ScreeningService> = OnceLock::new();

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Artifacts not loaded yet
    Unloaded,
    /// Accepting submissions
    Ready,
    /// Artifacts could not be loaded; submissions are refused
    LoadFailed(String),
}

enum Inner<C> {
    Unloaded,
    Ready {
        classifier: Arc<C>,
        encoders: Arc<CategoricalEncoders>,
    },
    LoadFailed(String),
}

/// Encodes responses and runs the classifier on them.
///
/// Read-only once constructed; share it behind `Arc` or the process-wide
/// instance from [`init_global`].
pub struct ScreeningService<C: Classifier = ExportedModel> {
    inner: Inner<C>,
}

impl<C: Classifier> Default for ScreeningService<C> {
    fn default() -> Self {
        Self::unloaded()
    }
}

impl ScreeningService<ExportedModel> {
    /// Load artifacts from the configured directory.
    ///
    /// Never fails: a load error is logged and recorded as `LoadFailed`.
    #[must_use]
    pub fn load(config: &AppConfig) -> Self {
        tracing::info!("Loading screening artifacts from {:?}", config.model_dir);

        let loaded = config
            .artifact_policy()
            .and_then(|policy| load_artifacts(&config.model_dir, &policy));

        match loaded {
            Ok(artifacts) => Self::ready(Arc::new(artifacts.model), Arc::new(artifacts.encoders)),
            Err(e) => {
                tracing::error!("Artifact load failed: {}", e);
                Self::failed(e.to_string())
            }
        }
    }
}

impl<C: Classifier> ScreeningService<C> {
    /// A service with nothing loaded.
    #[must_use]
    pub fn unloaded() -> Self {
        Self {
            inner: Inner::Unloaded,
        }
    }

    /// A ready service over already-loaded parts.
    #[must_use]
    pub fn ready(classifier: Arc<C>, encoders: Arc<CategoricalEncoders>) -> Self {
        Self {
            inner: Inner::Ready {
                classifier,
                encoders,
            },
        }
    }

    /// A service whose load failed for `reason`.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            inner: Inner::LoadFailed(reason.into()),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.inner {
            Inner::Unloaded => SessionState::Unloaded,
            Inner::Ready { .. } => SessionState::Ready,
            Inner::LoadFailed(reason) => SessionState::LoadFailed(reason.clone()),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready { .. })
    }

    /// Known labels for a categorical field, in code order.
    ///
    /// Empty unless the service is ready.
    #[must_use]
    pub fn known_labels(&self, field: CategoricalField) -> &[String] {
        match &self.inner {
            Inner::Ready { encoders, .. } => encoders.get(field).labels(),
            _ => &[],
        }
    }

    /// Description of the loaded classifier, if any.
    #[must_use]
    pub fn model_description(&self) -> Option<String> {
        match &self.inner {
            Inner::Ready { classifier, .. } => Some(classifier.describe()),
            _ => None,
        }
    }

    /// Screen one response.
    ///
    /// # Errors
    /// - `NotReady` if artifacts are not loaded (checked first)
    /// - `Validation` if a field is out of range
    /// - `Encode` for a categorical label outside the known set
    /// - `Inference` if the classifier fails
    pub fn submit(&self, response: &RawResponse) -> Result<ScreeningResult, ScreeningError> {
        let (classifier, encoders) = match &self.inner {
            Inner::Ready {
                classifier,
                encoders,
            } => (classifier, encoders),
            Inner::Unloaded => {
                return Err(ScreeningError::NotReady("model not loaded".into()));
            }
            Inner::LoadFailed(reason) => {
                tracing::warn!("Submission refused: artifacts failed to load");
                return Err(ScreeningError::NotReady(reason.clone()));
            }
        };

        response
            .validate()
            .map_err(|errors| ScreeningError::Validation(errors.join("; ")))?;

        let features = encode_features(response, encoders)?;
        tracing::debug!("Encoded response into {} features", features.len());

        let result = run_inference(classifier.as_ref(), &features)?;
        tracing::info!("Screening complete");

        Ok(result)
    }
}

/// Initialize the process-wide service. Later calls return the existing
/// instance and ignore `config`.
pub fn init_global(config: &AppConfig) -> &'static ScreeningService {
    GLOBAL.get_or_init(|| ScreeningService::load(config))
}

/// The process-wide service, if [`init_global`] has run.
#[must_use]
pub fn global() -> Option<&'static ScreeningService> {
    GLOBAL.get()
}
