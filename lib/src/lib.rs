//! # streamfeat
//!
//! Online feature extraction for data that arrives one observation at a time.
//! Each extractor keeps O(1) running state per group key and reports its
//! feature from the state *before* the current observation, so features can
//! feed a model trained on the same stream without leaking labels.
//!
//! ## Core Design Principles
//!
//! - **Score, then learn**: `learn_one` reads the feature and only then folds
//!   the sample in. The split `transform_one` / `update_one` calls exist for
//!   delayed-label setups and keep the same contract.
//! - **Bounded per-key state**: every statistic is an exact O(1)-space
//!   accumulator (Welford moments, compensated sums, extrema, last value).
//! - **Undefined is data**: a statistic without enough history is `None`,
//!   never an error.
//! - **Owned state**: extractors share nothing; run parallel streams by
//!   sharding keys across independent instances.
//!
//! ## Quick Start
//!
//! ```rust
//! use streamfeat::feature_extraction::{Aggregator, StatKind, StreamTransformer};
//! use streamfeat::Sample;
//!
//! let mut agg = Aggregator::new("amount", &["user"], StatKind::Mean).unwrap();
//!
//! for (user, amount) in [("ann", 10.0), ("ann", 20.0), ("bob", 5.0)] {
//!     let x = Sample::new().with("user", user).with("amount", amount);
//!     let features = agg.learn_one(&x).unwrap();
//!     println!("{:?}", features["amount_mean_by_user"]);
//! }
//! ```
//!
//! ## Module Structure
//!
//! - `sample` — observations, field values and group keys
//! - `feature_extraction` — accumulators, keyed store and the extractors
//! - `serialization` — byte encoding of checkpoints

/// Observations, field values and group keys.
pub mod sample;

/// Streaming feature extractors over keyed running statistics.
pub mod feature_extraction;

/// Checkpoint byte encoding.
pub mod serialization;

pub use feature_extraction::FeatureError;
pub use sample::{Key, Sample, Value};
