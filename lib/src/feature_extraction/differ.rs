//! Sample-to-sample differences within a group.
//!
//! For each sample, [`Differ`] emits `v - v_prev`, where `v_prev` is the value
//! of the previous sample with the same key. The first sample of a key has no
//! predecessor and gets the configured sentinel.

use crate::feature_extraction::error::FeatureError;
use crate::feature_extraction::store::{KeyedStore, KeyedStoreParams};
use crate::feature_extraction::traits::{
    by_suffix, validate_by, Checkpoint, FeatureStep, Features, StreamTransformer,
};
use crate::sample::{Key, Sample, Value};
use serde::{Deserialize, Serialize};

/// Configuration for [`Differ`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifferConfig {
    /// Field whose consecutive values are differenced.
    pub on: String,
    /// Fields forming the group key, in order.
    pub by: Vec<String>,
    /// Value for the first sample of a key. Undefined by default.
    #[serde(default)]
    pub unseen: Option<f64>,
}

impl DifferConfig {
    pub fn new<S: Into<String>>(on: impl Into<String>, by: impl IntoIterator<Item = S>) -> Self {
        Self {
            on: on.into(),
            by: by.into_iter().map(Into::into).collect(),
            unseen: None,
        }
    }

    pub fn with_unseen(mut self, unseen: f64) -> Self {
        self.unseen = Some(unseen);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        serde_json::from_str(json).map_err(|e| FeatureError::config(e.to_string()))
    }

    pub fn build(self) -> Result<Differ, FeatureError> {
        validate_by(&self.by)?;
        if self.on.is_empty() {
            return Err(FeatureError::config("value field name must be non-empty"));
        }
        let name = format!("{}_diff_{}", self.on, by_suffix(&self.by));
        log::debug!("built Differ emitting {}", name);
        Ok(Differ {
            name,
            config: self,
            last: KeyedStore::new(),
        })
    }
}

/// Difference between a sample's value and its key's previous value.
#[derive(Clone, Debug)]
pub struct Differ {
    config: DifferConfig,
    name: String,
    last: KeyedStore<f64>,
}

impl Differ {
    pub fn new(on: &str, by: &[&str]) -> Result<Self, FeatureError> {
        DifferConfig::new(on, by.iter().copied()).build()
    }

    pub fn config(&self) -> &DifferConfig {
        &self.config
    }

    pub fn feature_name(&self) -> &str {
        &self.name
    }

    pub fn n_keys(&self) -> usize {
        self.last.len()
    }

    /// Last value stored for a key.
    pub fn last_value(&self, key_values: &[Value]) -> Option<f64> {
        self.last.get(&Key::from_values(key_values)).copied()
    }
}

impl StreamTransformer for Differ {
    type Output = Features;

    fn transform_one(&self, x: &Sample) -> Result<Features, FeatureError> {
        let key = x.key(&self.config.by)?;
        let v = x.number(&self.config.on)?;
        let diff = match self.last.get(&key) {
            Some(prev) => Some(v - prev),
            None => self.config.unseen,
        };
        Ok(Features::from([(self.name.clone(), diff)]))
    }

    fn update_one(&mut self, x: &Sample) -> Result<(), FeatureError> {
        let key = x.key(&self.config.by)?;
        let v = x.number(&self.config.on)?;
        *self.last.get_or_create(key, || v) = v;
        Ok(())
    }
}

impl FeatureStep for Differ {
    fn transform_step(&self, x: &Sample) -> Result<Features, FeatureError> {
        StreamTransformer::transform_one(self, x)
    }

    fn check_step(&self, x: &Sample, _y: Option<f64>) -> Result<(), FeatureError> {
        x.key(&self.config.by)?;
        x.number(&self.config.on).map(|_| ())
    }

    fn update_step(&mut self, x: &Sample, _y: Option<f64>) -> Result<(), FeatureError> {
        StreamTransformer::update_one(self, x)
    }

    fn feature_names(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn is_supervised(&self) -> bool {
        false
    }
}

/// Checkpoint of a [`Differ`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DifferParams {
    pub config: DifferConfig,
    pub last: KeyedStoreParams<f64>,
}

impl Checkpoint for Differ {
    type Params = DifferParams;

    fn extract_params(&self) -> DifferParams {
        DifferParams {
            config: self.config.clone(),
            last: self.last.extract_params(),
        }
    }

    fn from_params(params: DifferParams) -> Result<Self, FeatureError> {
        let mut differ = params.config.build()?;
        differ.last = KeyedStore::from_params(params.last)?;
        log::debug!("restored Differ with {} keys", differ.last.len());
        Ok(differ)
    }
}
