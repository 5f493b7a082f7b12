use crate::buffer::WorkerBuffers;
use crate::dispatch::{FailureSlot, WorkDispatcher};
use crate::pipeline::PipelineHandle;
use crate::BenchError;

/// Shared state every worker of one measurement borrows.
#[derive(Clone, Copy)]
pub struct WorkerContext<'a> {
    pub pipeline: &'a PipelineHandle,
    pub dispatcher: &'a WorkDispatcher,
    pub failures: &'a FailureSlot,
}

/// Drains the dispatcher on the calling thread and returns how many items this worker executed.
///
/// Failures never escape: allocation or stage errors end the loop and are
/// recorded into the shared [`FailureSlot`].
pub fn run_worker(worker: usize, context: WorkerContext<'_>) -> u64 {
    let mut executed = 0;
    if let Err(err) = drain(worker, context, &mut executed) {
        tracing::warn!(worker, executed, error = %err, "worker stopped on failure");
        context.failures.record(err);
    }
    executed
}

fn drain(worker: usize, context: WorkerContext<'_>, executed: &mut u64) -> Result<(), BenchError> {
    let pipeline = context.pipeline;
    let mut buffers = WorkerBuffers::allocate(pipeline.config(), pipeline.scratch_size())?;
    tracing::debug!(worker, bytes = buffers.total_bytes(), "worker buffers allocated");
    while context.dispatcher.claim().is_some() {
        pipeline.execute(&mut buffers)?;
        *executed += 1;
    }
    Ok(())
}
