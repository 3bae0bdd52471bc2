//! Per-event latency of `learn_one` across key cardinalities.
//!
//! Run with: cargo run --release --package benchmarks --bin throughput_report

use benchmarks::{time_fn, BenchmarkStats, EventStream, StreamConfig, Timer};
use std::error::Error;
use streamfeat::feature_extraction::{
    Aggregator, Differ, FeatureStep, FeatureUnion, StatKind, TargetEncoder,
};

const N_EVENTS: usize = 200_000;

fn build_union() -> Result<FeatureUnion, Box<dyn Error>> {
    Ok(FeatureUnion::new()
        .with(Aggregator::new("amount", &["user"], StatKind::Mean)?)?
        .with(Differ::new("amount", &["user"])?)?
        .with(TargetEncoder::new(&["user"], 5.0)?)?)
}

/// Time score-then-learn of a single step, one event at a time.
fn run_step(
    step: &mut dyn FeatureStep,
    stream: &EventStream,
) -> Result<(Vec<f64>, f64), Box<dyn Error>> {
    let mut timer = Timer::new();
    let mut times = Vec::with_capacity(stream.len());
    for (x, y) in stream.samples.iter().zip(&stream.labels) {
        timer.start();
        step.transform_step(x)?;
        step.update_step(x, Some(*y))?;
        times.push(timer.stop().as_secs_f64() * 1e6);
    }
    Ok((times, timer.total_ms()))
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("streamfeat throughput report ({} events per run)", N_EVENTS);

    for n_keys in [10, 1_000, 100_000] {
        let (stream, gen_time) =
            time_fn(|| EventStream::generate(StreamConfig::new(N_EVENTS, n_keys)));
        println!(
            "\n=== {} keys (stream generated in {:.1}ms) ===",
            n_keys,
            gen_time.as_secs_f64() * 1000.0
        );

        let mut aggregator = Aggregator::new("amount", &["user"], StatKind::Mean)?;
        let mut differ = Differ::new("amount", &["user"])?;
        let mut encoder = TargetEncoder::new(&["user"], 5.0)?;
        let steps: [(&str, &mut dyn FeatureStep); 3] = [
            ("aggregator", &mut aggregator),
            ("differ", &mut differ),
            ("encoder", &mut encoder),
        ];
        for (name, step) in steps {
            let (times, total_ms) = run_step(step, &stream)?;
            if let Some(stats) = BenchmarkStats::from_times(times) {
                println!("{:<12} {}  total {:.1}ms", name, stats, total_ms);
            }
        }

        let mut union = build_union()?;
        let mut times = Vec::with_capacity(stream.len());
        for (x, y) in stream.samples.iter().zip(&stream.labels) {
            let (result, elapsed) = time_fn(|| union.learn_one(x, Some(*y)));
            result?;
            times.push(elapsed.as_secs_f64() * 1e6);
        }
        if let Some(stats) = BenchmarkStats::from_times(times) {
            println!("{:<12} {}", "union", stats);
        }
    }

    Ok(())
}
