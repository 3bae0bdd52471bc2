//! Smoothed online target encoding.
//!
//! [`TargetEncoder`] replaces a categorical key by the running mean of the
//! target within that key, shrunk toward the global running mean:
//!
//! ```text
//! encoded = (n_k * mean_k + w * global_mean) / (n_k + w)
//! ```
//!
//! `n_k` and `mean_k` describe the targets seen for key `k`, `global_mean`
//! every target seen so far, all taken before the current sample. `w = 0`
//! gives the plain per-key mean; a large `w` pulls rare keys toward the
//! global mean. A key never seen before is encoded as the global mean.

use crate::feature_extraction::error::FeatureError;
use crate::feature_extraction::stats::Moments;
use crate::feature_extraction::store::{KeyedStore, KeyedStoreParams};
use crate::feature_extraction::traits::{
    by_suffix, validate_by, Checkpoint, FeatureStep, Features, SupervisedStreamTransformer,
};
use crate::sample::{Key, Sample, Value};
use serde::{Deserialize, Serialize};

fn default_target_name() -> String {
    "target".to_string()
}

/// Configuration for [`TargetEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoderConfig {
    /// Fields forming the group key, in order.
    pub by: Vec<String>,
    /// Shrinkage weight `w`, non-negative.
    #[serde(default)]
    pub smoothing: f64,
    /// Name of the target, used in the output feature name.
    #[serde(default = "default_target_name")]
    pub target_name: String,
    /// Value returned before any target has been seen. Undefined by default.
    #[serde(default)]
    pub unseen: Option<f64>,
}

impl TargetEncoderConfig {
    pub fn new<S: Into<String>>(by: impl IntoIterator<Item = S>) -> Self {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            smoothing: 0.0,
            target_name: default_target_name(),
            unseen: None,
        }
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_target_name(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = target_name.into();
        self
    }

    pub fn with_unseen(mut self, unseen: f64) -> Self {
        self.unseen = Some(unseen);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        serde_json::from_str(json).map_err(|e| FeatureError::config(e.to_string()))
    }

    pub fn build(self) -> Result<TargetEncoder, FeatureError> {
        validate_by(&self.by)?;
        if !(self.smoothing.is_finite() && self.smoothing >= 0.0) {
            return Err(FeatureError::config(format!(
                "smoothing must be a finite non-negative number, got {}",
                self.smoothing
            )));
        }
        if self.target_name.is_empty() {
            return Err(FeatureError::config("target name must be non-empty"));
        }
        let name = format!("{}_encoded_{}", self.target_name, by_suffix(&self.by));
        log::debug!(
            "built TargetEncoder emitting {} (smoothing {})",
            name,
            self.smoothing
        );
        Ok(TargetEncoder {
            name,
            config: self,
            per_key: KeyedStore::new(),
            global: Moments::new(),
        })
    }
}

/// Online target encoder with shrinkage toward the global mean.
#[derive(Clone, Debug)]
pub struct TargetEncoder {
    config: TargetEncoderConfig,
    name: String,
    per_key: KeyedStore<Moments>,
    global: Moments,
}

impl TargetEncoder {
    pub fn new(by: &[&str], smoothing: f64) -> Result<Self, FeatureError> {
        TargetEncoderConfig::new(by.iter().copied())
            .with_smoothing(smoothing)
            .build()
    }

    pub fn config(&self) -> &TargetEncoderConfig {
        &self.config
    }

    pub fn feature_name(&self) -> &str {
        &self.name
    }

    pub fn n_keys(&self) -> usize {
        self.per_key.len()
    }

    /// Mean of every target seen so far.
    pub fn global_mean(&self) -> Option<f64> {
        self.global.mean()
    }

    /// Target count and mean of one key.
    pub fn key_stats(&self, key_values: &[Value]) -> Option<(u64, f64)> {
        let moments = self.per_key.get(&Key::from_values(key_values))?;
        moments.mean().map(|mean| (moments.count(), mean))
    }

    fn encode(&self, key: &Key) -> Option<f64> {
        let global_mean = match self.global.mean() {
            Some(mean) => mean,
            None => return self.config.unseen,
        };
        let moments = match self.per_key.get(key) {
            Some(moments) => moments,
            None => return Some(global_mean),
        };
        let (n, mean) = match moments.mean() {
            Some(mean) => (moments.count(), mean),
            None => return Some(global_mean),
        };
        // Same as (n * mean + w * g) / (n + w), exact for w == 0.
        let w = self.config.smoothing;
        Some(mean + w * (global_mean - mean) / (n as f64 + w))
    }
}

impl SupervisedStreamTransformer for TargetEncoder {
    type Output = Features;

    fn transform_one(&self, x: &Sample) -> Result<Features, FeatureError> {
        let key = x.key(&self.config.by)?;
        Ok(Features::from([(self.name.clone(), self.encode(&key))]))
    }

    fn update_one(&mut self, x: &Sample, y: f64) -> Result<(), FeatureError> {
        let key = x.key(&self.config.by)?;
        self.per_key.get_or_create(key, Moments::new).push(y);
        self.global.push(y);
        Ok(())
    }
}

impl FeatureStep for TargetEncoder {
    fn transform_step(&self, x: &Sample) -> Result<Features, FeatureError> {
        SupervisedStreamTransformer::transform_one(self, x)
    }

    fn check_step(&self, x: &Sample, y: Option<f64>) -> Result<(), FeatureError> {
        x.key(&self.config.by)?;
        y.map(|_| ())
            .ok_or_else(|| FeatureError::MissingTarget(self.name.clone()))
    }

    fn update_step(&mut self, x: &Sample, y: Option<f64>) -> Result<(), FeatureError> {
        let y = y.ok_or_else(|| FeatureError::MissingTarget(self.name.clone()))?;
        SupervisedStreamTransformer::update_one(self, x, y)
    }

    fn feature_names(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn is_supervised(&self) -> bool {
        true
    }
}

/// Checkpoint of a [`TargetEncoder`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetEncoderParams {
    pub config: TargetEncoderConfig,
    pub per_key: KeyedStoreParams<Moments>,
    pub global: Moments,
}

impl Checkpoint for TargetEncoder {
    type Params = TargetEncoderParams;

    fn extract_params(&self) -> TargetEncoderParams {
        TargetEncoderParams {
            config: self.config.clone(),
            per_key: self.per_key.extract_params(),
            global: self.global,
        }
    }

    fn from_params(params: TargetEncoderParams) -> Result<Self, FeatureError> {
        let mut encoder = params.config.build()?;
        encoder.per_key = KeyedStore::from_params(params.per_key)?;
        encoder.global = params.global;
        log::debug!("restored TargetEncoder with {} keys", encoder.per_key.len());
        Ok(encoder)
    }
}
