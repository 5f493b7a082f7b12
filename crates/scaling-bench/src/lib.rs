#![forbid(unsafe_code)]

//! Thread-scaling throughput benchmark for a fixed image-processing pipeline.
//!
//! For every thread count in the swept range a fresh pool of workers drains a
//! shared [`WorkDispatcher`], each worker running the whole pipeline on its own
//! [`WorkerBuffers`]. The first failure of any worker aborts the sweep.

mod buffer;
mod dispatch;
mod driver;
mod error;
mod pipeline;
mod report;
mod worker;

pub use buffer::{ALIGNMENT, AlignedBuffer, WorkerBuffers, aligned_stride};
pub use dispatch::{FailureSlot, WorkDispatcher, WorkItem};
pub use driver::{Measurement, ScalingDriver, ThreadRange, hardware_concurrency};
pub use error::{BenchError, PipelineStage};
pub use pipeline::PipelineHandle;
pub use report::{SweepReport, banner, format_measurement};
pub use worker::{WorkerContext, run_worker};
