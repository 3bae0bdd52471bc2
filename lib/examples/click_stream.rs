//! Click Stream Example: per-user running features
//!
//! Reads a small click log from CSV and, for every event, emits features that
//! only use the events before it:
//! - running mean and count of the basket value per user
//! - change in basket value since the user's previous event
//! - smoothed conversion rate per (user, page) pair
//!
//! The label (`converted`) of each event is only learned after its features
//! have been emitted, exactly as a model trained online on this stream would
//! see it.
//!
//! Run with: RUST_LOG=debug cargo run --example click_stream

use serde::Deserialize;
use std::error::Error;
use streamfeat::feature_extraction::{
    AggregatorConfig, Checkpoint, Differ, FeatureUnion, StatKind, StreamTransformer,
    TargetEncoderConfig,
};
use streamfeat::Sample;

const CLICK_LOG: &str = "\
user,page,basket,converted
ann,home,0.0,0
bob,home,12.5,0
ann,product,30.0,0
ann,checkout,45.0,1
bob,product,20.0,0
cid,home,5.0,0
bob,checkout,20.0,1
ann,home,10.0,0
cid,product,60.0,1
ann,checkout,55.0,1
";

#[derive(Debug, Deserialize)]
struct Click {
    user: String,
    page: String,
    basket: f64,
    converted: u8,
}

impl Click {
    fn sample(&self) -> Sample {
        Sample::new()
            .with("user", self.user.as_str())
            .with("page", self.page.as_str())
            .with("basket", self.basket)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("=== Click Stream Features ===\n");

    let basket_stats = AggregatorConfig::new(["user"])
        .with_stat("basket", StatKind::Mean)
        .with_stat("basket", StatKind::Count)
        .build()?;
    let basket_diff = Differ::new("basket", &["user"])?;
    let conversion = TargetEncoderConfig::new(["user", "page"])
        .with_smoothing(2.0)
        .with_target_name("converted")
        .build()?;

    let mut union = FeatureUnion::new()
        .with(basket_stats)?
        .with(basket_diff)?
        .with(conversion)?;
    println!("Steps: {:?}", union.step_names());
    println!("Features: {:?}\n", union.feature_names());

    let mut reader = csv::Reader::from_reader(CLICK_LOG.as_bytes());
    for (i, row) in reader.deserialize::<Click>().enumerate() {
        let click = row?;
        let features = union.learn_one(&click.sample(), Some(click.converted as f64))?;

        println!("event {:>2} {:<4} {:<9}", i, click.user, click.page);
        for (name, value) in &features {
            match value {
                Some(v) => println!("    {:<40} {:>8.3}", name, v),
                None => println!("    {:<40} {:>8}", name, "-"),
            }
        }
    }

    // Standalone extractors can be checkpointed and resumed.
    let mut diff = Differ::new("basket", &["user"])?;
    diff.learn_one(&Sample::new().with("user", "ann").with("basket", 10.0))?;
    let path = std::env::temp_dir().join("click_stream_differ.bin");
    diff.save_to_file(&path)?;
    let resumed = Differ::load_from_file(&path)?;
    println!(
        "\nResumed differ tracks {} key(s) as {}",
        resumed.n_keys(),
        resumed.feature_name()
    );
    std::fs::remove_file(path).ok();

    Ok(())
}
