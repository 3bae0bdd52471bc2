// Prints the benchmark suite contents.

fn main() {
    println!("streamfeat Benchmark Suite");
    println!();
    println!("Usage:");
    println!("  cargo bench --package benchmarks");
    println!("  cargo bench --package benchmarks --bench <benchmark_name>");
    println!();
    println!("Available benchmarks:");
    println!("  - aggregation: learn_one throughput of Aggregator and Differ by key cardinality");
    println!("  - target_encoding: learn_one throughput of TargetEncoder and FeatureUnion");
    println!();
    println!("Per-event latency report:");
    println!("  cargo run --release --package benchmarks --bin throughput_report");
}
