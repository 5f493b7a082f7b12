use bench::{prepare, run_pipeline_once, scaled_config};
use common::SamplePrecision;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn pipeline_invocation_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_invocation");
    group.sample_size(10);
    for precision in [SamplePrecision::Float, SamplePrecision::Half] {
        for divisor in [8_u32, 4, 1] {
            let config = scaled_config(divisor, precision);
            let Ok((pipeline, mut buffers)) = prepare(&config) else {
                continue;
            };
            group.throughput(Throughput::Elements(config.destination.sample_count() as u64));
            group.bench_function(
                BenchmarkId::new(precision.as_str(), config.destination.to_string()),
                |b| {
                    b.iter(|| black_box(run_pipeline_once(&pipeline, black_box(&mut buffers))));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, pipeline_invocation_bench);
criterion_main!(benches);
