//! Domain layer: Core screening types and the feature encoding contract.
//!
//! Pure Rust types with no I/O. Everything here is deterministic.

mod encoder;
mod features;
mod response;
mod result;

pub use encoder::{
    CategoricalEncoder, CategoricalEncoders, CategoricalField, EncodeError, EncoderBuildError,
};
pub use features::{column, encode_features, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use response::{Answer, Gender, RawResponse, AGE_RANGE, QUESTIONS, QUESTION_COUNT};
pub use result::{Outcome, ScreeningResult, DISCLAIMER};
