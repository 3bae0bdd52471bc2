//! Shared helpers for the streamfeat benchmarks.
//!
//! - Synthetic event streams with a controllable number of distinct keys
//! - Timing utilities for throughput reports outside criterion

pub mod data;
pub mod utils;

pub use data::{EventStream, StreamConfig};
pub use utils::{time_fn, BenchmarkStats, Timer};
