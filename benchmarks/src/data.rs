//! Deterministic synthetic event streams.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use streamfeat::Sample;

/// Shape of a generated stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    pub n_events: usize,
    pub n_keys: usize,
    pub seed: u64,
}

impl StreamConfig {
    pub fn new(n_events: usize, n_keys: usize) -> Self {
        Self {
            n_events,
            n_keys,
            seed: 42,
        }
    }
}

/// Pre-built samples with fields `user`, `amount` and a 0/1 label.
pub struct EventStream {
    pub samples: Vec<Sample>,
    pub labels: Vec<f64>,
}

impl EventStream {
    pub fn generate(config: StreamConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let n_keys = config.n_keys.max(1) as i64;
        let mut samples = Vec::with_capacity(config.n_events);
        let mut labels = Vec::with_capacity(config.n_events);
        for _ in 0..config.n_events {
            let user = rng.gen_range(0..n_keys);
            let amount = (rng.gen_range(0.0..1000.0_f64) * 100.0).round() / 100.0;
            samples.push(Sample::new().with("user", user).with("amount", amount));
            labels.push(if rng.gen_bool(0.5) { 1.0 } else { 0.0 });
        }
        Self { samples, labels }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let a = EventStream::generate(StreamConfig::new(100, 7));
        let b = EventStream::generate(StreamConfig::new(100, 7));
        assert_eq!(a.len(), 100);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.labels, b.labels);
    }
}
