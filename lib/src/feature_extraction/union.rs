//! Several extractors over one stream.
//!
//! [`FeatureUnion`] runs heterogeneous extractors side by side and merges
//! their features. `learn_one` scores the sample with every step before any
//! step learns from it, so no step ever sees the current sample, whatever the
//! order the steps were added in.
//!
//! # Example
//! ```
//! use streamfeat::feature_extraction::{Aggregator, Differ, FeatureUnion, StatKind, TargetEncoder};
//! use streamfeat::Sample;
//!
//! let mut union = FeatureUnion::new()
//!     .with(Aggregator::new("amount", &["user"], StatKind::Mean).unwrap()).unwrap()
//!     .with(Differ::new("amount", &["user"]).unwrap()).unwrap()
//!     .with(TargetEncoder::new(&["user"], 1.0).unwrap()).unwrap();
//!
//! let x = Sample::new().with("user", "u1").with("amount", 12.0);
//! let features = union.learn_one(&x, Some(1.0)).unwrap();
//! assert_eq!(features.len(), 3);
//! ```

use crate::feature_extraction::error::FeatureError;
use crate::feature_extraction::traits::{FeatureStep, Features};
use crate::sample::Sample;

/// Extractors evaluated together on every sample.
#[derive(Default)]
pub struct FeatureUnion {
    steps: Vec<Box<dyn FeatureStep>>,
}

impl FeatureUnion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step. Fails if one of its feature names is already emitted.
    pub fn push(&mut self, step: Box<dyn FeatureStep>) -> Result<(), FeatureError> {
        let taken = self.feature_names();
        if let Some(dup) = step.feature_names().into_iter().find(|n| taken.contains(n)) {
            return Err(FeatureError::config(format!(
                "feature '{}' of {} is already emitted by another step",
                dup,
                step.step_name()
            )));
        }
        log::debug!(
            "FeatureUnion: added {} as step {}",
            step.step_name(),
            self.steps.len()
        );
        self.steps.push(step);
        Ok(())
    }

    /// Builder-style [`FeatureUnion::push`].
    pub fn with<S: FeatureStep + 'static>(mut self, step: S) -> Result<Self, FeatureError> {
        self.push(Box::new(step))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of every step, in insertion order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.steps.iter().flat_map(|s| s.feature_names()).collect()
    }

    /// Whether any step learns from the target.
    pub fn is_supervised(&self) -> bool {
        self.steps.iter().any(|s| s.is_supervised())
    }

    /// Merged features of every step, from pre-sample state.
    pub fn transform_one(&self, x: &Sample) -> Result<Features, FeatureError> {
        let mut features = Features::new();
        for step in &self.steps {
            features.extend(step.transform_step(x)?);
        }
        Ok(features)
    }

    /// Fold `x` (and its target, if any) into every step.
    ///
    /// Every step checks the sample first; a missing field or target in any
    /// of them fails the call before a single step is updated.
    pub fn update_one(&mut self, x: &Sample, y: Option<f64>) -> Result<(), FeatureError> {
        for step in &self.steps {
            step.check_step(x, y)?;
        }
        for step in &mut self.steps {
            step.update_step(x, y)?;
        }
        Ok(())
    }

    /// Score `x` with every step, then update every step.
    pub fn learn_one(&mut self, x: &Sample, y: Option<f64>) -> Result<Features, FeatureError> {
        let features = self.transform_one(x)?;
        self.update_one(x, y)?;
        Ok(features)
    }
}
