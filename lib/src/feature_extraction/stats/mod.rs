//! Running statistics held per group key.
//!
//! [`Accumulator`] is a closed set of O(1)-space statistics behind one
//! `add`/`read` interface. The kind is chosen from configuration at build time;
//! updates dispatch on the enum tag, not through a vtable.
//!
//! # Non-finite input
//!
//! `add` never fails. NaN and infinities are folded in like any other value
//! and propagate through the arithmetic: a NaN poisons `sum`, `mean`, `var`
//! and `std` for good, and `min`/`max` treat NaN as absorbing. `count` counts
//! such values and `last` stores them.

mod compensated;
mod welford;

pub use compensated::CompensatedSum;
pub use welford::Moments;

use crate::feature_extraction::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which statistic an accumulator maintains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Count,
    Sum,
    Mean,
    #[serde(rename = "var", alias = "variance")]
    Variance,
    Std,
    Min,
    Max,
    Last,
}

impl StatKind {
    /// Short name used when naming output features.
    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Count => "count",
            StatKind::Sum => "sum",
            StatKind::Mean => "mean",
            StatKind::Variance => "var",
            StatKind::Std => "std",
            StatKind::Min => "min",
            StatKind::Max => "max",
            StatKind::Last => "last",
        }
    }

    /// Value reported for a key that has never been updated.
    ///
    /// Counting statistics start from their identity; everything else is
    /// undefined.
    pub fn default_sentinel(&self) -> Option<f64> {
        match self {
            StatKind::Count | StatKind::Sum => Some(0.0),
            _ => None,
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatKind {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(StatKind::Count),
            "sum" => Ok(StatKind::Sum),
            "mean" => Ok(StatKind::Mean),
            "var" | "variance" => Ok(StatKind::Variance),
            "std" => Ok(StatKind::Std),
            "min" => Ok(StatKind::Min),
            "max" => Ok(StatKind::Max),
            "last" => Ok(StatKind::Last),
            other => Err(FeatureError::config(format!(
                "unknown statistic kind '{}'",
                other
            ))),
        }
    }
}

/// Default delta degrees of freedom for `var` and `std` (sample variance).
pub const DEFAULT_DDOF: u32 = 1;

/// One running statistic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Accumulator {
    Count { n: u64 },
    Sum(CompensatedSum),
    Mean(Moments),
    Variance { moments: Moments, ddof: u32 },
    Std { moments: Moments, ddof: u32 },
    Min { value: Option<f64> },
    Max { value: Option<f64> },
    Last { value: Option<f64> },
}

impl Accumulator {
    /// Fresh accumulator of the given kind, using [`DEFAULT_DDOF`].
    pub fn new(kind: StatKind) -> Self {
        Self::with_ddof(kind, DEFAULT_DDOF)
    }

    /// Fresh accumulator; `ddof` only matters for `var` and `std`.
    pub fn with_ddof(kind: StatKind, ddof: u32) -> Self {
        match kind {
            StatKind::Count => Accumulator::Count { n: 0 },
            StatKind::Sum => Accumulator::Sum(CompensatedSum::new()),
            StatKind::Mean => Accumulator::Mean(Moments::new()),
            StatKind::Variance => Accumulator::Variance {
                moments: Moments::new(),
                ddof,
            },
            StatKind::Std => Accumulator::Std {
                moments: Moments::new(),
                ddof,
            },
            StatKind::Min => Accumulator::Min { value: None },
            StatKind::Max => Accumulator::Max { value: None },
            StatKind::Last => Accumulator::Last { value: None },
        }
    }

    pub fn kind(&self) -> StatKind {
        match self {
            Accumulator::Count { .. } => StatKind::Count,
            Accumulator::Sum(_) => StatKind::Sum,
            Accumulator::Mean(_) => StatKind::Mean,
            Accumulator::Variance { .. } => StatKind::Variance,
            Accumulator::Std { .. } => StatKind::Std,
            Accumulator::Min { .. } => StatKind::Min,
            Accumulator::Max { .. } => StatKind::Max,
            Accumulator::Last { .. } => StatKind::Last,
        }
    }

    /// Fold one observation in.
    #[inline]
    pub fn add(&mut self, x: f64) {
        match self {
            Accumulator::Count { n } => *n += 1,
            Accumulator::Sum(sum) => sum.add(x),
            Accumulator::Mean(moments)
            | Accumulator::Variance { moments, .. }
            | Accumulator::Std { moments, .. } => moments.push(x),
            Accumulator::Min { value } => {
                *value = Some(match *value {
                    Some(m) if m.is_nan() || !(x.is_nan() || x < m) => m,
                    _ => x,
                })
            }
            Accumulator::Max { value } => {
                *value = Some(match *value {
                    Some(m) if m.is_nan() || !(x.is_nan() || x > m) => m,
                    _ => x,
                })
            }
            Accumulator::Last { value } => *value = Some(x),
        }
    }

    /// Current value, `None` while the statistic is undefined.
    pub fn read(&self) -> Option<f64> {
        match self {
            Accumulator::Count { n } => Some(*n as f64),
            Accumulator::Sum(sum) => Some(sum.total()),
            Accumulator::Mean(moments) => moments.mean(),
            Accumulator::Variance { moments, ddof } => moments.variance(*ddof),
            Accumulator::Std { moments, ddof } => moments.variance(*ddof).map(f64::sqrt),
            Accumulator::Min { value } | Accumulator::Max { value } | Accumulator::Last { value } => {
                *value
            }
        }
    }

    /// Number of observations, for the kinds that track one.
    pub fn count(&self) -> Option<u64> {
        match self {
            Accumulator::Count { n } => Some(*n),
            Accumulator::Mean(moments)
            | Accumulator::Variance { moments, .. }
            | Accumulator::Std { moments, .. } => Some(moments.count()),
            _ => None,
        }
    }
}
