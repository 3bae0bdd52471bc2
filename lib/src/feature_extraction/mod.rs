//! Online feature extraction from keyed running statistics.
//!
//! Every extractor here shares the same shape: a [`KeyedStore`] of per-group
//! state, created lazily on first sight of a key, read by `transform_one`
//! before the sample is absorbed by `update_one`.
//!
//! # Extractors
//!
//! | Extractor | Feature for sample `s` in group `k` |
//! |-----------|-------------------------------------|
//! | [`Aggregator`] | running statistics of value fields in `k` |
//! | [`TargetAggregator`] | running statistic of the target in `k` |
//! | [`Differ`] | `v(s)` minus the previous value in `k` |
//! | [`TargetEncoder`] | target mean of `k`, shrunk toward the global mean |
//!
//! [`FeatureUnion`] runs any mix of them on the same stream.
//!
//! # Example
//!
//! ```
//! use streamfeat::feature_extraction::{SupervisedStreamTransformer, TargetEncoder};
//! use streamfeat::Sample;
//!
//! let mut encoder = TargetEncoder::new(&["city"], 0.0).unwrap();
//! let x = Sample::new().with("city", "lyon");
//!
//! // Score first, then learn: the sample never sees its own label.
//! let before = encoder.learn_one(&x, 1.0).unwrap();
//! assert_eq!(before["target_encoded_by_city"], None);
//! let after = encoder.transform_one(&x).unwrap();
//! assert_eq!(after["target_encoded_by_city"], Some(1.0));
//! ```

pub mod agg;
pub mod differ;
pub mod error;
pub mod stats;
pub mod store;
pub mod target_encoding;
pub mod traits;
pub mod union;

pub use agg::{
    Aggregator, AggregatorConfig, AggregatorParams, StatSpec, TargetAggregator,
    TargetAggregatorConfig, TargetAggregatorParams,
};
pub use differ::{Differ, DifferConfig, DifferParams};
pub use error::FeatureError;
pub use stats::{Accumulator, StatKind};
pub use store::{Handle, KeyedStore, KeyedStoreParams};
pub use target_encoding::{TargetEncoder, TargetEncoderConfig, TargetEncoderParams};
pub use traits::{Checkpoint, FeatureStep, Features, StreamTransformer, SupervisedStreamTransformer};
pub use union::FeatureUnion;
