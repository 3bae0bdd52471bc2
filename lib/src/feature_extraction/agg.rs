//! Grouped running aggregates.
//!
//! [`Aggregator`] computes, for each sample, running statistics of one or more
//! value fields within the sample's group, as they stood before the sample.
//! [`TargetAggregator`] does the same over the supervised target instead of a
//! feature column, which is how "historical target behaviour of this key"
//! features are built without leaking the sample's own label.
//!
//! Output features are named `{on}_{how}_by_{by}`, e.g. `amount_mean_by_user`
//! or `target_mean_by_shop_and_day`.
//!
//! # Example
//! ```
//! use streamfeat::feature_extraction::{Aggregator, StatKind, StreamTransformer};
//! use streamfeat::Sample;
//!
//! let mut agg = Aggregator::new("v", &["k"], StatKind::Mean).unwrap();
//!
//! let a = agg.learn_one(&Sample::new().with("k", "A").with("v", 10.0)).unwrap();
//! let b = agg.learn_one(&Sample::new().with("k", "A").with("v", 20.0)).unwrap();
//! assert_eq!(a["v_mean_by_k"], None);
//! assert_eq!(b["v_mean_by_k"], Some(10.0));
//! ```

use crate::feature_extraction::error::FeatureError;
use crate::feature_extraction::stats::{Accumulator, StatKind, DEFAULT_DDOF};
use crate::feature_extraction::store::{KeyedStore, KeyedStoreParams};
use crate::feature_extraction::traits::{
    by_suffix, validate_by, Checkpoint, FeatureStep, Features, StreamTransformer,
    SupervisedStreamTransformer,
};
use crate::sample::{Key, Sample, Value};
use serde::{Deserialize, Serialize};

fn default_ddof() -> u32 {
    DEFAULT_DDOF
}

fn default_target_name() -> String {
    "target".to_string()
}

/// One `(value field, statistic)` pair of an [`Aggregator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatSpec {
    /// Field whose values are aggregated.
    pub on: String,
    /// Statistic to maintain.
    pub how: StatKind,
    /// Delta degrees of freedom for `var`/`std`.
    #[serde(default = "default_ddof")]
    pub ddof: u32,
    /// Value for keys never seen before. `None` uses the statistic's default.
    #[serde(default)]
    pub unseen: Option<f64>,
}

impl StatSpec {
    pub fn new(on: impl Into<String>, how: StatKind) -> Self {
        Self {
            on: on.into(),
            how,
            ddof: DEFAULT_DDOF,
            unseen: None,
        }
    }

    pub fn with_ddof(mut self, ddof: u32) -> Self {
        self.ddof = ddof;
        self
    }

    pub fn with_unseen(mut self, unseen: f64) -> Self {
        self.unseen = Some(unseen);
        self
    }

    fn sentinel(&self) -> Option<f64> {
        self.unseen.or_else(|| self.how.default_sentinel())
    }

    fn accumulator(&self) -> Accumulator {
        Accumulator::with_ddof(self.how, self.ddof)
    }
}

/// Configuration for [`Aggregator`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Fields forming the group key, in order.
    pub by: Vec<String>,
    /// Statistics maintained per group.
    pub stats: Vec<StatSpec>,
}

impl AggregatorConfig {
    pub fn new<S: Into<String>>(by: impl IntoIterator<Item = S>) -> Self {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            stats: Vec::new(),
        }
    }

    /// Add a statistic with default ddof and sentinel.
    pub fn with_stat(self, on: impl Into<String>, how: StatKind) -> Self {
        self.with_spec(StatSpec::new(on, how))
    }

    pub fn with_spec(mut self, spec: StatSpec) -> Self {
        self.stats.push(spec);
        self
    }

    /// Parse from JSON, e.g. `{"by": ["user"], "stats": [{"on": "amount", "how": "mean"}]}`.
    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        serde_json::from_str(json).map_err(|e| FeatureError::config(e.to_string()))
    }

    fn feature_names(&self) -> Vec<String> {
        let suffix = by_suffix(&self.by);
        self.stats
            .iter()
            .map(|s| format!("{}_{}_{}", s.on, s.how.name(), suffix))
            .collect()
    }

    fn validate(&self) -> Result<Vec<String>, FeatureError> {
        validate_by(&self.by)?;
        if self.stats.is_empty() {
            return Err(FeatureError::config("at least one statistic is required"));
        }
        if self.stats.iter().any(|s| s.on.is_empty()) {
            return Err(FeatureError::config("value field names must be non-empty"));
        }
        let names = self.feature_names();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(FeatureError::config(format!(
                    "statistic '{}' is configured twice",
                    name
                )));
            }
        }
        Ok(names)
    }

    /// Validate and build the aggregator.
    pub fn build(self) -> Result<Aggregator, FeatureError> {
        let names = self.validate()?;
        log::debug!("built Aggregator emitting {:?}", names);
        Ok(Aggregator {
            sentinels: self.stats.iter().map(StatSpec::sentinel).collect(),
            names,
            config: self,
            store: KeyedStore::new(),
        })
    }
}

/// Running grouped statistics over feature fields.
///
/// Every configured statistic has its own accumulator per key; all of them
/// share the key scheme, so one lookup serves the whole row.
#[derive(Clone, Debug)]
pub struct Aggregator {
    config: AggregatorConfig,
    names: Vec<String>,
    sentinels: Vec<Option<f64>>,
    store: KeyedStore<Vec<Accumulator>>,
}

impl Aggregator {
    /// Single-statistic aggregator of `on` grouped by `by`.
    pub fn new(on: &str, by: &[&str], how: StatKind) -> Result<Self, FeatureError> {
        AggregatorConfig::new(by.iter().copied())
            .with_stat(on, how)
            .build()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Output feature names, in configuration order.
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Number of distinct keys seen so far.
    pub fn n_keys(&self) -> usize {
        self.store.len()
    }

    /// Key and every value field of `x`, in configuration order.
    fn extract(&self, x: &Sample) -> Result<(Key, Vec<f64>), FeatureError> {
        let key = x.key(&self.config.by)?;
        let values = self
            .config
            .stats
            .iter()
            .map(|s| x.number(&s.on))
            .collect::<Result<Vec<f64>, _>>()?;
        Ok((key, values))
    }

    /// Accumulators of one group, in configuration order.
    pub fn state(&self, key_values: &[Value]) -> Option<&[Accumulator]> {
        self.store
            .get(&Key::from_values(key_values))
            .map(Vec::as_slice)
    }
}

impl StreamTransformer for Aggregator {
    type Output = Features;

    fn transform_one(&self, x: &Sample) -> Result<Features, FeatureError> {
        let key = x.key(&self.config.by)?;
        let values: Vec<Option<f64>> = match self.store.get(&key) {
            Some(row) => row.iter().map(Accumulator::read).collect(),
            None => self.sentinels.clone(),
        };
        Ok(self.names.iter().cloned().zip(values).collect())
    }

    fn update_one(&mut self, x: &Sample) -> Result<(), FeatureError> {
        let (key, values) = self.extract(x)?;

        let stats = &self.config.stats;
        let row = self
            .store
            .get_or_create(key, || stats.iter().map(StatSpec::accumulator).collect());
        for (acc, v) in row.iter_mut().zip(values) {
            acc.add(v);
        }
        Ok(())
    }
}

impl FeatureStep for Aggregator {
    fn transform_step(&self, x: &Sample) -> Result<Features, FeatureError> {
        StreamTransformer::transform_one(self, x)
    }

    fn check_step(&self, x: &Sample, _y: Option<f64>) -> Result<(), FeatureError> {
        self.extract(x).map(|_| ())
    }

    fn update_step(&mut self, x: &Sample, _y: Option<f64>) -> Result<(), FeatureError> {
        StreamTransformer::update_one(self, x)
    }

    fn feature_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn is_supervised(&self) -> bool {
        false
    }
}

/// Checkpoint of an [`Aggregator`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatorParams {
    pub config: AggregatorConfig,
    pub store: KeyedStoreParams<Vec<Accumulator>>,
}

impl Checkpoint for Aggregator {
    type Params = AggregatorParams;

    fn extract_params(&self) -> AggregatorParams {
        AggregatorParams {
            config: self.config.clone(),
            store: self.store.extract_params(),
        }
    }

    fn from_params(params: AggregatorParams) -> Result<Self, FeatureError> {
        for (key, row) in &params.store.entries {
            let kinds_match = row.len() == params.config.stats.len()
                && row
                    .iter()
                    .zip(&params.config.stats)
                    .all(|(acc, spec)| acc.kind() == spec.how);
            if !kinds_match {
                return Err(FeatureError::Serialization(format!(
                    "stored row for {:?} does not match the configured statistics",
                    key
                )));
            }
        }
        let mut agg = params.config.build()?;
        agg.store = KeyedStore::from_params(params.store)?;
        log::debug!("restored Aggregator with {} keys", agg.store.len());
        Ok(agg)
    }
}

/// Configuration for [`TargetAggregator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetAggregatorConfig {
    /// Fields forming the group key, in order.
    pub by: Vec<String>,
    /// Statistic of the target to maintain.
    pub how: StatKind,
    /// Delta degrees of freedom for `var`/`std`.
    #[serde(default = "default_ddof")]
    pub ddof: u32,
    /// Name of the target, used in the output feature name.
    #[serde(default = "default_target_name")]
    pub target_name: String,
    /// Value for keys never seen before. `None` uses the statistic's default.
    #[serde(default)]
    pub unseen: Option<f64>,
}

impl TargetAggregatorConfig {
    pub fn new<S: Into<String>>(by: impl IntoIterator<Item = S>, how: StatKind) -> Self {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            how,
            ddof: DEFAULT_DDOF,
            target_name: default_target_name(),
            unseen: None,
        }
    }

    pub fn with_target_name(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = target_name.into();
        self
    }

    pub fn with_ddof(mut self, ddof: u32) -> Self {
        self.ddof = ddof;
        self
    }

    pub fn with_unseen(mut self, unseen: f64) -> Self {
        self.unseen = Some(unseen);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        serde_json::from_str(json).map_err(|e| FeatureError::config(e.to_string()))
    }

    pub fn build(self) -> Result<TargetAggregator, FeatureError> {
        validate_by(&self.by)?;
        if self.target_name.is_empty() {
            return Err(FeatureError::config("target name must be non-empty"));
        }
        let name = format!(
            "{}_{}_{}",
            self.target_name,
            self.how.name(),
            by_suffix(&self.by)
        );
        log::debug!("built TargetAggregator emitting {}", name);
        Ok(TargetAggregator {
            sentinel: self.unseen.or_else(|| self.how.default_sentinel()),
            name,
            config: self,
            store: KeyedStore::new(),
        })
    }
}

/// Running grouped statistic of the supervised target.
#[derive(Clone, Debug)]
pub struct TargetAggregator {
    config: TargetAggregatorConfig,
    name: String,
    sentinel: Option<f64>,
    store: KeyedStore<Accumulator>,
}

impl TargetAggregator {
    pub fn new(by: &[&str], how: StatKind) -> Result<Self, FeatureError> {
        TargetAggregatorConfig::new(by.iter().copied(), how).build()
    }

    pub fn config(&self) -> &TargetAggregatorConfig {
        &self.config
    }

    pub fn feature_name(&self) -> &str {
        &self.name
    }

    pub fn n_keys(&self) -> usize {
        self.store.len()
    }

    pub fn state(&self, key_values: &[Value]) -> Option<&Accumulator> {
        self.store.get(&Key::from_values(key_values))
    }
}

impl SupervisedStreamTransformer for TargetAggregator {
    type Output = Features;

    fn transform_one(&self, x: &Sample) -> Result<Features, FeatureError> {
        let key = x.key(&self.config.by)?;
        let value = match self.store.get(&key) {
            Some(acc) => acc.read(),
            None => self.sentinel,
        };
        Ok(Features::from([(self.name.clone(), value)]))
    }

    fn update_one(&mut self, x: &Sample, y: f64) -> Result<(), FeatureError> {
        let key = x.key(&self.config.by)?;
        let (how, ddof) = (self.config.how, self.config.ddof);
        self.store
            .get_or_create(key, || Accumulator::with_ddof(how, ddof))
            .add(y);
        Ok(())
    }
}

impl FeatureStep for TargetAggregator {
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

/// Checkpoint of a [`TargetAggregator`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetAggregatorParams {
    pub config: TargetAggregatorConfig,
    pub store: KeyedStoreParams<Accumulator>,
}

impl Checkpoint for TargetAggregator {
    type Params = TargetAggregatorParams;

    fn extract_params(&self) -> TargetAggregatorParams {
        TargetAggregatorParams {
            config: self.config.clone(),
            store: self.store.extract_params(),
        }
    }

    fn from_params(params: TargetAggregatorParams) -> Result<Self, FeatureError> {
        let how = params.config.how;
        if let Some((key, _)) = params.store.entries.iter().find(|(_, a)| a.kind() != how) {
            return Err(FeatureError::Serialization(format!(
                "stored accumulator for {:?} is not a '{}'",
                key, how
            )));
        }
        let mut agg = params.config.build()?;
        agg.store = KeyedStore::from_params(params.store)?;
        log::debug!("restored TargetAggregator with {} keys", agg.store.len());
        Ok(agg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kv(k: &str, v: f64) -> Sample {
        Sample::new().with("k", k).with("v", v)
    }

    #[test]
    fn test_mean_end_to_end() {
        let mut agg = Aggregator::new("v", &["k"], StatKind::Mean).unwrap();
        let stream = [kv("A", 10.0), kv("A", 20.0), kv("B", 5.0)];

        let out: Vec<Option<f64>> = stream
            .iter()
            .map(|s| agg.learn_one(s).unwrap()["v_mean_by_k"])
            .collect();
        assert_eq!(out, vec![None, Some(10.0), None]);

        let a = agg.state(&[Value::from("A")]).unwrap();
        assert_eq!(a[0].count(), Some(2));
        assert_eq!(a[0].read(), Some(15.0));
        let b = agg.state(&[Value::from("B")]).unwrap();
        assert_eq!(b[0].count(), Some(1));
        assert_eq!(b[0].read(), Some(5.0));
    }

    #[test]
    fn test_second_sample_sees_only_first() {
        for how in [StatKind::Sum, StatKind::Max, StatKind::Last, StatKind::Mean] {
            let mut agg = Aggregator::new("v", &["k"], how).unwrap();
            let first = agg.learn_one(&kv("A", 3.0)).unwrap();
            let second = agg.learn_one(&kv("A", 100.0)).unwrap();
            let name = format!("v_{}_by_k", how);
            assert_eq!(first[&name], how.default_sentinel());
            assert_eq!(second[&name], Some(3.0), "{}", how);
        }
    }

    #[test]
    fn test_count_unseen_is_zero() {
        let mut agg = Aggregator::new("v", &["k"], StatKind::Count).unwrap();
        assert_eq!(agg.learn_one(&kv("A", 1.0)).unwrap()["v_count_by_k"], Some(0.0));
        assert_eq!(agg.learn_one(&kv("A", 1.0)).unwrap()["v_count_by_k"], Some(1.0));
    }

    #[test]
    fn test_custom_unseen_sentinel() {
        let mut agg = AggregatorConfig::new(["k"])
            .with_spec(StatSpec::new("v", StatKind::Mean).with_unseen(-1.0))
            .build()
            .unwrap();
        assert_eq!(agg.learn_one(&kv("A", 4.0)).unwrap()["v_mean_by_k"], Some(-1.0));
        assert_eq!(agg.learn_one(&kv("A", 6.0)).unwrap()["v_mean_by_k"], Some(4.0));
    }

    #[test]
    fn test_variance_undefined_until_two_values() {
        let mut agg = Aggregator::new("v", &["k"], StatKind::Variance).unwrap();
        let outs: Vec<Option<f64>> = [1.0, 3.0, 5.0]
            .iter()
            .map(|&v| agg.learn_one(&kv("A", v)).unwrap()["v_var_by_k"])
            .collect();
        assert_eq!(outs, vec![None, None, Some(2.0)]);
    }

    #[test]
    fn test_multi_statistic_mode() {
        let mut agg = AggregatorConfig::new(["k"])
            .with_stat("v", StatKind::Count)
            .with_stat("v", StatKind::Mean)
            .with_stat("w", StatKind::Max)
            .build()
            .unwrap();
        assert_eq!(
            agg.feature_names(),
            &["v_count_by_k", "v_mean_by_k", "w_max_by_k"]
        );

        agg.learn_one(&kv("A", 2.0).with("w", 7.0)).unwrap();
        let out = agg.learn_one(&kv("A", 4.0).with("w", 1.0)).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out["v_count_by_k"], Some(1.0));
        assert_eq!(out["v_mean_by_k"], Some(2.0));
        assert_eq!(out["w_max_by_k"], Some(7.0));

        let row = agg.state(&[Value::from("A")]).unwrap();
        assert_eq!(row[0].read(), Some(2.0));
        assert_eq!(row[1].read(), Some(3.0));
        assert_eq!(row[2].read(), Some(7.0));
        assert_eq!(agg.n_keys(), 1);
    }

    #[test]
    fn test_composite_key() {
        let mut agg = Aggregator::new("v", &["shop", "day"], StatKind::Sum).unwrap();
        let s = |shop: &str, day: i64, v: f64| {
            Sample::new().with("shop", shop).with("day", day).with("v", v)
        };
        agg.learn_one(&s("s1", 1, 2.0)).unwrap();
        agg.learn_one(&s("s1", 2, 5.0)).unwrap();
        let out = agg.learn_one(&s("s1", 1, 0.0)).unwrap();
        assert_eq!(out["v_sum_by_shop_and_day"], Some(2.0));
        assert_eq!(agg.n_keys(), 2);
    }

    #[test]
    fn test_transform_does_not_create_keys() {
        let agg = Aggregator::new("v", &["k"], StatKind::Mean).unwrap();
        agg.transform_one(&kv("A", 1.0)).unwrap();
        // Value field is not needed to score.
        agg.transform_one(&Sample::new().with("k", "B")).unwrap();
        assert_eq!(agg.n_keys(), 0);
    }

    #[test]
    fn test_missing_fields_leave_state_untouched() {
        let mut agg = AggregatorConfig::new(["k"])
            .with_stat("v", StatKind::Count)
            .with_stat("w", StatKind::Sum)
            .build()
            .unwrap();
        agg.learn_one(&kv("A", 1.0).with("w", 1.0)).unwrap();

        let err = agg.update_one(&kv("A", 1.0)).unwrap_err();
        assert!(matches!(err, FeatureError::MissingField { field } if field == "w"));
        let err = agg.learn_one(&Sample::new().with("v", 1.0)).unwrap_err();
        assert!(matches!(err, FeatureError::MissingField { field } if field == "k"));
        let err = agg
            .update_one(&Sample::new().with("k", "B").with("v", "x").with("w", 1.0))
            .unwrap_err();
        assert!(matches!(err, FeatureError::NonNumericField { .. }));

        let row = agg.state(&[Value::from("A")]).unwrap();
        assert_eq!(row[0].count(), Some(1));
        assert_eq!(row[1].read(), Some(1.0));
        assert_eq!(agg.n_keys(), 1);
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            Aggregator::new("v", &[], StatKind::Mean),
            Err(FeatureError::Configuration(_))
        ));
        assert!(matches!(
            AggregatorConfig::new(["k"]).build(),
            Err(FeatureError::Configuration(_))
        ));
        assert!(matches!(
            AggregatorConfig::new(["k"])
                .with_stat("v", StatKind::Mean)
                .with_stat("v", StatKind::Mean)
                .build(),
            Err(FeatureError::Configuration(_))
        ));
        assert!(Aggregator::new("", &["k"], StatKind::Mean).is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config = AggregatorConfig::from_json(
            r#"{"by": ["user"], "stats": [
                {"on": "amount", "how": "variance", "ddof": 0},
                {"on": "amount", "how": "count"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.stats[0].how, StatKind::Variance);
        assert_eq!(config.stats[0].ddof, 0);
        assert_eq!(config.stats[1].ddof, DEFAULT_DDOF);
        let agg = config.build().unwrap();
        assert_eq!(agg.feature_names(), &["amount_var_by_user", "amount_count_by_user"]);

        let bad = AggregatorConfig::from_json(
            r#"{"by": ["user"], "stats": [{"on": "amount", "how": "median"}]}"#,
        );
        assert!(matches!(bad, Err(FeatureError::Configuration(_))));
    }

    #[test]
    fn test_aggregator_checkpoint_file() {
        let mut agg = AggregatorConfig::new(["k"])
            .with_stat("v", StatKind::Mean)
            .with_stat("v", StatKind::Std)
            .build()
            .unwrap();
        for (k, v) in [("A", 1.0), ("B", 2.0), ("A", 4.0), ("A", 0.5)] {
            agg.learn_one(&kv(k, v)).unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agg.bin");
        agg.save_to_file(&path).unwrap();
        let mut loaded = Aggregator::load_from_file(&path).unwrap();

        for probe in [kv("A", 0.0), kv("B", 0.0), kv("C", 0.0)] {
            assert_eq!(
                agg.transform_one(&probe).unwrap(),
                loaded.transform_one(&probe).unwrap()
            );
        }
        assert_eq!(
            agg.learn_one(&kv("A", 9.0)).unwrap(),
            loaded.learn_one(&kv("A", 9.0)).unwrap()
        );
    }

    #[test]
    fn test_aggregator_from_params_rejects_mismatched_rows() {
        let mut agg = Aggregator::new("v", &["k"], StatKind::Mean).unwrap();
        agg.learn_one(&kv("A", 1.0)).unwrap();
        let mut params = agg.extract_params();
        params.config.stats[0].how = StatKind::Max;
        assert!(matches!(
            Aggregator::from_params(params),
            Err(FeatureError::Serialization(_))
        ));
    }

    #[test]
    fn test_target_aggregator_uses_only_past_targets() {
        let mut agg = TargetAggregator::new(&["k"], StatKind::Mean).unwrap();
        assert_eq!(agg.feature_name(), "target_mean_by_k");

        let x = Sample::new().with("k", "A");
        let first = agg.learn_one(&x, 1.0).unwrap();
        let second = agg.learn_one(&x, 0.0).unwrap();
        let third = agg.learn_one(&x, 1.0).unwrap();
        assert_eq!(first["target_mean_by_k"], None);
        assert_eq!(second["target_mean_by_k"], Some(1.0));
        assert_eq!(third["target_mean_by_k"], Some(0.5));
        assert_eq!(agg.state(&[Value::from("A")]).unwrap().count(), Some(3));
    }

    #[test]
    fn test_target_aggregator_named_target() {
        let mut agg = TargetAggregatorConfig::new(["shop"], StatKind::Sum)
            .with_target_name("revenue")
            .build()
            .unwrap();
        let x = Sample::new().with("shop", 7);
        let out = agg.learn_one(&x, 12.0).unwrap();
        assert_eq!(out["revenue_sum_by_shop"], Some(0.0));
        assert_eq!(
            SupervisedStreamTransformer::transform_one(&agg, &x).unwrap()["revenue_sum_by_shop"],
            Some(12.0)
        );
    }

    #[test]
    fn test_target_aggregator_step_requires_target() {
        let mut agg = TargetAggregator::new(&["k"], StatKind::Mean).unwrap();
        let x = Sample::new().with("k", "A");
        let err = agg.update_step(&x, None).unwrap_err();
        assert!(matches!(err, FeatureError::MissingTarget(name) if name == "target_mean_by_k"));
        assert!(matches!(
            agg.check_step(&x, None),
            Err(FeatureError::MissingTarget(_))
        ));
        assert_eq!(agg.n_keys(), 0);
        assert!(agg.is_supervised());
    }

    #[test]
    fn test_target_aggregator_unseen_override() {
        let mut agg = TargetAggregatorConfig::new(["k"], StatKind::Mean)
            .with_unseen(-1.0)
            .build()
            .unwrap();
        let x = Sample::new().with("k", "A");
        assert_eq!(agg.learn_one(&x, 4.0).unwrap()["target_mean_by_k"], Some(-1.0));
        assert_eq!(agg.learn_one(&x, 2.0).unwrap()["target_mean_by_k"], Some(4.0));

        let other = Sample::new().with("k", "B");
        let out = SupervisedStreamTransformer::transform_one(&agg, &other).unwrap();
        assert_eq!(out["target_mean_by_k"], Some(-1.0));
    }

    #[test]
    fn test_check_step_validates_every_value_field() {
        let agg = AggregatorConfig::new(["k"])
            .with_stat("v", StatKind::Sum)
            .with_stat("w", StatKind::Max)
            .build()
            .unwrap();
        assert!(agg.check_step(&kv("A", 1.0).with("w", 2.0), None).is_ok());
        assert!(matches!(
            agg.check_step(&kv("A", 1.0), None),
            Err(FeatureError::MissingField { field }) if field == "w"
        ));
        assert!(matches!(
            agg.check_step(&kv("A", 1.0).with("w", "x"), None),
            Err(FeatureError::NonNumericField { .. })
        ));
        assert_eq!(agg.n_keys(), 0);
    }

    #[test]
    fn test_target_aggregator_checkpoint_round_trip() {
        let mut agg = TargetAggregatorConfig::new(["k"], StatKind::Variance)
            .with_ddof(0)
            .build()
            .unwrap();
        for (k, y) in [("A", 1.0), ("A", 3.0), ("B", 2.0)] {
            agg.learn_one(&Sample::new().with("k", k), y).unwrap();
        }
        let restored = TargetAggregator::from_params(agg.extract_params()).unwrap();
        let x = Sample::new().with("k", "A");
        assert_eq!(
            SupervisedStreamTransformer::transform_one(&restored, &x).unwrap()["target_var_by_k"],
            Some(1.0)
        );
        assert_eq!(restored.n_keys(), 2);
    }

    proptest! {
        #[test]
        fn prop_transform_is_idempotent(
            stream in prop::collection::vec((0u8..4, -1e3f64..1e3), 1..100)
        ) {
            let mut agg = AggregatorConfig::new(["k"])
                .with_stat("v", StatKind::Mean)
                .with_stat("v", StatKind::Variance)
                .with_stat("v", StatKind::Min)
                .build()
                .unwrap();
            for (k, v) in stream {
                let s = Sample::new().with("k", k as i64).with("v", v);
                let first = agg.transform_one(&s).unwrap();
                let again = agg.transform_one(&s).unwrap();
                prop_assert_eq!(&first, &again);
                prop_assert_eq!(agg.learn_one(&s).unwrap(), first);
            }
        }

        #[test]
        fn prop_count_grows_by_one_per_update(keys in prop::collection::vec(0u8..5, 1..200)) {
            let mut agg = Aggregator::new("v", &["k"], StatKind::Count).unwrap();
            for k in keys {
                let s = Sample::new().with("k", k as i64).with("v", 1.0);
                let before = agg.transform_one(&s).unwrap()["v_count_by_k"].unwrap();
                agg.update_one(&s).unwrap();
                let after = agg.transform_one(&s).unwrap()["v_count_by_k"].unwrap();
                prop_assert_eq!(after, before + 1.0);
            }
        }
    }
}
