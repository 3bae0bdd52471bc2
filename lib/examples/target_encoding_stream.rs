//! Target Encoding Example: smoothing on a skewed category stream
//!
//! Simulates a stream of (city, sold) events where a few cities are frequent
//! and many are rare, then compares online target encoders with different
//! smoothing weights. Rare cities are noisy with `smoothing = 0` and pulled
//! toward the global rate as the weight grows.
//!
//! The encoder state is checkpointed halfway through and the second half of
//! the stream is replayed on the restored copy to show that resuming gives
//! the same features.
//!
//! Run with: cargo run --example target_encoding_stream

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use streamfeat::feature_extraction::{
    Checkpoint, StatKind, SupervisedStreamTransformer, TargetAggregatorConfig, TargetEncoder,
};
use streamfeat::Sample;

/// Deterministic pseudo-random stream: (city, label).
fn city_stream(n: usize) -> Vec<(String, f64)> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            // Cities 0..3 are frequent, 3..40 rare.
            let city: u32 = if rng.gen_bool(0.75) {
                rng.gen_range(0..3)
            } else {
                rng.gen_range(3..40)
            };
            let rate = match city {
                0 => 0.2,
                1 => 0.5,
                2 => 0.8,
                _ => 0.35,
            };
            let sold = if rng.gen_bool(rate) { 1.0 } else { 0.0 };
            (format!("city_{}", city), sold)
        })
        .collect()
}

fn squared_error(encoder: &mut TargetEncoder, stream: &[(String, f64)]) -> Result<f64, Box<dyn Error>> {
    let name = encoder.feature_name().to_string();
    let mut total = 0.0;
    let mut scored = 0usize;
    for (city, y) in stream {
        let x = Sample::new().with("city", city.as_str());
        if let Some(p) = encoder.learn_one(&x, *y)?[&name] {
            total += (p - y).powi(2);
            scored += 1;
        }
    }
    Ok(total / scored.max(1) as f64)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let stream = city_stream(5_000);

    println!("=== Smoothing Comparison ===\n");
    println!("{:>10} {:>12} {:>8}", "smoothing", "mean sq err", "keys");
    for smoothing in [0.0, 1.0, 5.0, 20.0, 100.0] {
        let mut encoder = TargetEncoder::new(&["city"], smoothing)?;
        let mse = squared_error(&mut encoder, &stream)?;
        println!("{:>10.1} {:>12.5} {:>8}", smoothing, mse, encoder.n_keys());
    }

    println!("\n=== Per-City Target Count ===\n");
    let mut counts = TargetAggregatorConfig::new(["city"], StatKind::Count)
        .with_target_name("sold")
        .build()?;
    for (city, y) in &stream {
        counts.update_one(&Sample::new().with("city", city.as_str()), *y)?;
    }
    for city in ["city_0", "city_1", "city_2", "city_3"] {
        let out = counts.transform_one(&Sample::new().with("city", city))?;
        println!("{:<8} {:>6.0}", city, out["sold_count_by_city"].unwrap_or(0.0));
    }

    println!("\n=== Checkpoint and Resume ===\n");
    let (first_half, second_half) = stream.split_at(stream.len() / 2);
    let mut uninterrupted = TargetEncoder::new(&["city"], 5.0)?;
    squared_error(&mut uninterrupted, first_half)?;

    let path = std::env::temp_dir().join("target_encoder_checkpoint.bin");
    uninterrupted.save_to_file(&path)?;
    let mut resumed = TargetEncoder::load_from_file(&path)?;
    std::fs::remove_file(&path).ok();

    let a = squared_error(&mut uninterrupted, second_half)?;
    let b = squared_error(&mut resumed, second_half)?;
    println!("second half error, uninterrupted: {:.6}", a);
    println!("second half error, resumed:       {:.6}", b);
    println!("global mean: {:?}", resumed.global_mean());

    Ok(())
}
