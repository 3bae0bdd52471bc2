//! Neumaier compensated running sum.

use serde::{Deserialize, Serialize};

/// Running sum that carries its own rounding error.
///
/// Once a non-finite value is seen the compensation term is no longer
/// meaningful, so the total becomes the plain IEEE sum from then on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() || !self.sum.is_finite() {
            self.sum += x;
            return;
        }
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        if self.sum.is_finite() {
            self.sum + self.compensation
        } else {
            self.sum
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_recovers_lost_low_bits() {
        let mut s = CompensatedSum::new();
        s.add(1e16);
        for _ in 0..10 {
            s.add(1.0);
        }
        s.add(-1e16);
        assert_eq!(s.total(), 10.0);
    }

    #[test]
    fn test_sum_tenths() {
        let mut s = CompensatedSum::new();
        for _ in 0..10_000 {
            s.add(0.1);
        }
        assert!((s.total() - 1000.0).abs() < 1e-12);
    }

    #[test]
    fn test_sum_non_finite_propagates() {
        let mut s = CompensatedSum::new();
        s.add(1.0);
        s.add(f64::INFINITY);
        s.add(2.0);
        assert_eq!(s.total(), f64::INFINITY);
        s.add(f64::NAN);
        assert!(s.total().is_nan());
    }
}
