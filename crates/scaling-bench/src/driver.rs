use crate::dispatch::{FailureSlot, WorkDispatcher};
use crate::pipeline::PipelineHandle;
use crate::worker::{WorkerContext, run_worker};
use crate::BenchError;
use common::BenchmarkConfig;
use pixel_engine::StageFactory;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Instant;

/// Number of threads the machine can run in parallel, at least 1.
pub fn hardware_concurrency() -> u32 {
    thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// Inclusive range of thread counts swept by one benchmark run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ThreadRange {
    pub min: u32,
    pub max: u32,
}

impl ThreadRange {
    /// A non-zero override pins the sweep to that single value; otherwise sweep `1..=hardware`.
    pub fn resolve(thread_override: Option<u32>, hardware: u32) -> Self {
        match thread_override {
            Some(threads) if threads > 0 => Self {
                min: threads,
                max: threads,
            },
            _ => Self {
                min: 1,
                max: hardware.max(1),
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + use<> {
        self.min..=self.max
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub thread_count: u32,
    pub total_iterations: u64,
    pub elapsed_seconds: f64,
    pub throughput: f64,
}

impl Measurement {
    fn new(thread_count: u32, total_iterations: u64, elapsed_seconds: f64) -> Self {
        let throughput = if elapsed_seconds > 0.0 {
            total_iterations as f64 / elapsed_seconds
        } else {
            0.0
        };
        Self {
            thread_count,
            total_iterations,
            elapsed_seconds,
            throughput,
        }
    }
}

/// Runs one measurement per thread count, strictly one after another.
pub struct ScalingDriver {
    pipeline: PipelineHandle,
    range: ThreadRange,
}

impl ScalingDriver {
    pub fn new(pipeline: PipelineHandle) -> Self {
        let range = ThreadRange::resolve(
            pipeline.config().thread_count_override,
            hardware_concurrency(),
        );
        Self { pipeline, range }
    }

    pub fn from_factory(
        factory: &dyn StageFactory,
        config: &BenchmarkConfig,
    ) -> Result<Self, BenchError> {
        Ok(Self::new(PipelineHandle::new(factory, config)?))
    }

    pub fn with_range(mut self, range: ThreadRange) -> Self {
        self.range = range;
        self
    }

    pub fn range(&self) -> ThreadRange {
        self.range
    }

    pub fn pipeline(&self) -> &PipelineHandle {
        &self.pipeline
    }

    /// Sweeps the thread range, handing each measurement to `on_measurement` as it completes.
    /// The first failing measurement aborts the sweep.
    pub fn sweep<F>(&self, mut on_measurement: F) -> Result<Vec<Measurement>, BenchError>
    where
        F: FnMut(&Measurement),
    {
        let mut measurements = Vec::with_capacity(self.range.len());
        for threads in self.range.iter() {
            let measurement = self.measure(threads)?;
            on_measurement(&measurement);
            measurements.push(measurement);
        }
        Ok(measurements)
    }

    pub fn measure(&self, threads: u32) -> Result<Measurement, BenchError> {
        if threads == 0 {
            return Err(BenchError::InvalidThreadCount);
        }
        let seed = self.pipeline.config().work_items_for(threads);
        let dispatcher = WorkDispatcher::new(seed);
        let failures = FailureSlot::default();
        let context = WorkerContext {
            pipeline: &self.pipeline,
            dispatcher: &dispatcher,
            failures: &failures,
        };
        tracing::debug!(threads, work_items = seed, "starting measurement");

        let started = Instant::now();
        let executed = thread::scope(|scope| -> Result<u64, BenchError> {
            let mut handles = Vec::new();
            handles
                .try_reserve_exact(threads as usize)
                .map_err(|_| BenchError::OutOfMemory {
                    bytes: handle_bytes(threads),
                })?;
            for worker in 0..threads as usize {
                let spawned = thread::Builder::new()
                    .name(format!("bench-worker-{worker}"))
                    .spawn_scoped(scope, move || run_worker(worker, context));
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(source) => {
                        failures.record(BenchError::ThreadSpawn { worker, source });
                        break;
                    }
                }
            }

            let mut executed = 0_u64;
            for (worker, handle) in handles {
                match handle.join() {
                    Ok(count) => executed += count,
                    Err(_) => {
                        failures.record(BenchError::WorkerPanicked { worker });
                    }
                }
            }
            Ok(executed)
        })?;
        let elapsed = started.elapsed();

        if let Some(failure) = failures.into_inner() {
            return Err(failure);
        }

        let measurement = Measurement::new(threads, executed, elapsed.as_secs_f64());
        tracing::info!(
            threads,
            iterations = measurement.total_iterations,
            fps = measurement.throughput,
            "measurement complete"
        );
        Ok(measurement)
    }
}

fn handle_bytes(threads: u32) -> usize {
    (threads as usize).saturating_mul(size_of::<(usize, thread::ScopedJoinHandle<'static, u64>)>())
}
