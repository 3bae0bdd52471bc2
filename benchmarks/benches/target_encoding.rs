use benchmarks::{EventStream, StreamConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use streamfeat::feature_extraction::{
    Aggregator, Differ, FeatureUnion, StatKind, SupervisedStreamTransformer, TargetEncoder,
};

const N_EVENTS: usize = 10_000;

fn bench_target_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_encoder");
    group.throughput(Throughput::Elements(N_EVENTS as u64));

    for n_keys in [10, 1_000, 100_000].iter() {
        let stream = EventStream::generate(StreamConfig::new(N_EVENTS, *n_keys));
        group.bench_with_input(BenchmarkId::from_parameter(n_keys), &stream, |b, stream| {
            b.iter(|| {
                let mut encoder = TargetEncoder::new(&["user"], 5.0).unwrap();
                for (x, y) in stream.samples.iter().zip(&stream.labels) {
                    black_box(encoder.learn_one(black_box(x), *y).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_feature_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_union");
    group.throughput(Throughput::Elements(N_EVENTS as u64));

    let stream = EventStream::generate(StreamConfig::new(N_EVENTS, 1_000));
    group.bench_function("three_steps", |b| {
        b.iter(|| {
            let mut union = FeatureUnion::new()
                .with(Aggregator::new("amount", &["user"], StatKind::Mean).unwrap())
                .unwrap()
                .with(Differ::new("amount", &["user"]).unwrap())
                .unwrap()
                .with(TargetEncoder::new(&["user"], 5.0).unwrap())
                .unwrap();
            for (x, y) in stream.samples.iter().zip(&stream.labels) {
                black_box(union.learn_one(black_box(x), Some(*y)).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_target_encoder, bench_feature_union);
criterion_main!(benches);
