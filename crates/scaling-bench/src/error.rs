use pixel_engine::EngineError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelineStage {
    Widen,
    Upsample,
    ColorTransform,
    Resample,
    Narrow,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Widen => "widen",
            Self::Upsample => "chroma-upsample",
            Self::ColorTransform => "color-transform",
            Self::Resample => "resample",
            Self::Narrow => "narrow",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to construct {stage} stage")]
    PipelineConstruction {
        stage: PipelineStage,
        #[source]
        source: EngineError,
    },
    #[error("{stage} stage failed")]
    PipelineInvocation {
        stage: PipelineStage,
        #[source]
        source: EngineError,
    },
    #[error("failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
    #[error("failed to spawn worker {worker}")]
    ThreadSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("thread count must be at least 1")]
    InvalidThreadCount,
}

impl BenchError {
    pub(crate) fn construction(stage: PipelineStage) -> impl FnOnce(EngineError) -> Self {
        move |source| Self::PipelineConstruction { stage, source }
    }

    pub(crate) fn invocation(stage: PipelineStage) -> impl FnOnce(EngineError) -> Self {
        move |source| Self::PipelineInvocation { stage, source }
    }
}
