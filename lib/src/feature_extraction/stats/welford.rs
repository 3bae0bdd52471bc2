//! Welford's online mean and variance.
//!
//! For every new value `x`:
//! ```text
//! n    = n + 1
//! d    = x - mean
//! mean = mean + d / n
//! m2   = m2 + d * (x - mean)
//! ```
//! `m2` is the running sum of squared deviations from the current mean, so the
//! variance never comes from subtracting two large, nearly equal sums.

use serde::{Deserialize, Serialize};

/// Running count, mean and sum of squared deviations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value in.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    /// Running mean, undefined before the first value.
    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then_some(self.mean)
    }

    /// Variance with `ddof` delta degrees of freedom: `m2 / (n - ddof)`.
    ///
    /// Undefined while `n <= ddof`.
    pub fn variance(&self, ddof: u32) -> Option<f64> {
        let ddof = ddof as u64;
        (self.n > ddof).then(|| self.m2 / (self.n - ddof) as f64)
    }
}
