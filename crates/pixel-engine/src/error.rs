use common::{PixelType, PlaneGeometry};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("unsupported conversion: {0}")]
    Unsupported(String),
    #[error("plane geometry mismatch: expected {expected}, found {found}")]
    GeometryMismatch {
        expected: PlaneGeometry,
        found: PlaneGeometry,
    },
    #[error("pixel type mismatch: expected {expected:?}, found {found:?}")]
    PixelTypeMismatch {
        expected: PixelType,
        found: PixelType,
    },
    #[error("stride {stride} is smaller than a row of {row_bytes} bytes")]
    InvalidStride { stride: usize, row_bytes: usize },
    #[error("plane buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall { required: usize, available: usize },
    #[error("scratch buffer too small: need {required} bytes, have {available}")]
    ScratchTooSmall { required: usize, available: usize },
    #[error("buffer is not aligned for {0:?} samples")]
    Misaligned(PixelType),
}

impl EngineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
