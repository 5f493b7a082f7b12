#![forbid(unsafe_code)]

use common::{BenchmarkConfig, PlaneGeometry, SamplePrecision};
use pixel_engine::NativeEngine;
use scaling_bench::{BenchError, PipelineHandle, WorkerBuffers, banner};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PipelineLatencyReport {
    pub workload: String,
    pub precision: SamplePrecision,
    pub iterations: usize,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub avg_us: u64,
}

/// The fixed workload with every dimension divided by `divisor`.
pub fn scaled_config(divisor: u32, precision: SamplePrecision) -> BenchmarkConfig {
    let base = BenchmarkConfig::default();
    let divisor = divisor.max(1);
    let scale = |geometry: PlaneGeometry| {
        PlaneGeometry::new(
            (geometry.width / divisor).max(2),
            (geometry.height / divisor).max(2),
        )
    };
    BenchmarkConfig {
        source: scale(base.source),
        chroma: scale(base.chroma),
        destination: scale(base.destination),
        precision,
        ..base
    }
}

/// Native pipeline plus one worker's buffers, ready for repeated invocation.
pub fn prepare(config: &BenchmarkConfig) -> Result<(PipelineHandle, WorkerBuffers), BenchError> {
    let pipeline = PipelineHandle::new(&NativeEngine, config)?;
    let buffers = WorkerBuffers::allocate(config, pipeline.scratch_size())?;
    Ok((pipeline, buffers))
}

pub fn run_pipeline_once(
    pipeline: &PipelineHandle,
    buffers: &mut WorkerBuffers,
) -> Result<(), BenchError> {
    pipeline.execute(buffers)
}

pub fn measure_pipeline_latency(
    config: &BenchmarkConfig,
    iterations: usize,
) -> Result<PipelineLatencyReport, BenchError> {
    let iterations = iterations.max(5);
    let (pipeline, mut buffers) = prepare(config)?;
    let mut samples = Vec::with_capacity(iterations);

    for _ in 0..iterations {
        let start = Instant::now();
        run_pipeline_once(&pipeline, &mut buffers)?;
        samples.push(start.elapsed().as_micros() as u64);
    }

    samples.sort_unstable();
    let total: u128 = samples.iter().copied().map(u128::from).sum();
    let avg = (total / samples.len() as u128) as u64;

    Ok(PipelineLatencyReport {
        workload: banner(config),
        precision: config.precision,
        iterations,
        p50_us: latency_at(&samples, 0.50),
        p95_us: latency_at(&samples, 0.95),
        p99_us: latency_at(&samples, 0.99),
        avg_us: avg,
    })
}

/// Nearest-rank quantile of ascending samples.
fn latency_at(sorted_us: &[u64], quantile: f64) -> u64 {
    let Some(&slowest) = sorted_us.last() else {
        return 0;
    };
    let rank = (quantile.clamp(0.0, 1.0) * sorted_us.len() as f64).ceil() as usize;
    sorted_us.get(rank.saturating_sub(1)).copied().unwrap_or(slowest)
}
