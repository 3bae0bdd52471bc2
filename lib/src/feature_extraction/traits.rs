//! Call contracts shared by every streaming feature extractor.
//!
//! Each extractor answers two questions per sample, in this order:
//! 1. `transform_one` — what is the feature, given only what was seen before
//!    this sample? A pure read; calling it repeatedly gives the same answer.
//! 2. `update_one` — absorb the sample. A pure write.
//!
//! Swapping the two leaks the sample (or its label) into its own feature.
//! `learn_one` performs both in the right order and is the entry point
//! pipelines should use; the split calls exist for callers that must score
//! and learn at different times (e.g. when the label arrives later).

use crate::feature_extraction::error::FeatureError;
use crate::sample::Sample;
use crate::serialization::SerializableParams;
use std::any::type_name;
use std::collections::BTreeMap;

/// Named feature values. `None` marks an undefined statistic.
pub type Features = BTreeMap<String, Option<f64>>;

/// Extractor whose state is driven by the samples themselves.
pub trait StreamTransformer {
    /// What `transform_one` produces.
    type Output;

    /// Feature for `x` from the state as it stood before `x`.
    fn transform_one(&self, x: &Sample) -> Result<Self::Output, FeatureError>;

    /// Fold `x` into the state.
    fn update_one(&mut self, x: &Sample) -> Result<(), FeatureError>;

    /// Score `x`, then learn from it.
    fn learn_one(&mut self, x: &Sample) -> Result<Self::Output, FeatureError> {
        let out = self.transform_one(x)?;
        self.update_one(x)?;
        Ok(out)
    }
}

/// Extractor whose state is driven by the supervised target of each sample.
pub trait SupervisedStreamTransformer {
    /// What `transform_one` produces.
    type Output;

    /// Feature for `x` from the targets seen before `x`.
    fn transform_one(&self, x: &Sample) -> Result<Self::Output, FeatureError>;

    /// Fold the target `y` of `x` into the state.
    fn update_one(&mut self, x: &Sample, y: f64) -> Result<(), FeatureError>;

    /// Score `x`, then learn from its target.
    fn learn_one(&mut self, x: &Sample, y: f64) -> Result<Self::Output, FeatureError> {
        let out = self.transform_one(x)?;
        self.update_one(x, y)?;
        Ok(out)
    }
}

/// Object-safe view of any extractor, used to run several side by side.
pub trait FeatureStep: Send {
    /// Same contract as [`StreamTransformer::transform_one`].
    fn transform_step(&self, x: &Sample) -> Result<Features, FeatureError>;

    /// Fail exactly when `update_step(x, y)` would, without touching state.
    ///
    /// Extracts the key, every value field and, for supervised steps, the
    /// target.
    fn check_step(&self, x: &Sample, y: Option<f64>) -> Result<(), FeatureError>;

    /// Fold `x` in. Supervised steps require `y`.
    fn update_step(&mut self, x: &Sample, y: Option<f64>) -> Result<(), FeatureError>;

    /// Names of the features this step emits.
    fn feature_names(&self) -> Vec<String>;

    /// Whether `update_step` needs a target.
    fn is_supervised(&self) -> bool;

    /// Short type name for logs and error messages.
    fn step_name(&self) -> &'static str {
        let full_name = type_name::<Self>();
        let before_generic = match full_name.find('<') {
            Some(pos) => &full_name[..pos],
            None => full_name,
        };
        match before_generic.rfind("::") {
            Some(pos) => &before_generic[pos + 2..],
            None => before_generic,
        }
    }
}

/// Checkpoint and restore of an extractor's full state.
///
/// `from_params(extract_params())` yields an extractor that answers every
/// `transform_one` exactly like the one it was taken from, and keeps learning
/// from there.
pub trait Checkpoint: Sized {
    /// Serializable image of configuration plus keyed state.
    type Params: SerializableParams;

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self, FeatureError>;

    /// Write the checkpoint to `path` (bincode).
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), FeatureError> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| FeatureError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a checkpoint written by [`Checkpoint::save_to_file`].
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, FeatureError> {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| FeatureError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}

/// Output name suffix shared by all extractors: `by_a_and_b`.
pub(crate) fn by_suffix(by: &[String]) -> String {
    format!("by_{}", by.join("_and_"))
}

/// Common check for the key fields of every extractor.
pub(crate) fn validate_by(by: &[String]) -> Result<(), FeatureError> {
    if by.is_empty() {
        return Err(FeatureError::config("at least one key field is required"));
    }
    if let Some(empty) = by.iter().find(|f| f.is_empty()) {
        return Err(FeatureError::config(format!(
            "key field names must be non-empty, got {:?}",
            empty
        )));
    }
    Ok(())
}
