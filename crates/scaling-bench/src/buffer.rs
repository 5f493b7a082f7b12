use crate::BenchError;
use bytemuck::{Pod, Zeroable};
use common::{BenchmarkConfig, PixelType, PlaneGeometry};
use pixel_engine::{EngineError, PlaneMut, PlaneRef};

/// Byte boundary every buffer base and row stride is aligned to.
pub const ALIGNMENT: usize = 64;

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
struct Block([u8; ALIGNMENT]);

/// Rounds `bytes` up to the next multiple of [`ALIGNMENT`].
pub fn aligned_stride(bytes: usize) -> Option<usize> {
    bytes.checked_next_multiple_of(ALIGNMENT)
}

/// Zero-initialised heap allocation with a 64-byte aligned base and row stride.
pub struct AlignedBuffer {
    blocks: Vec<Block>,
    len: usize,
    stride: usize,
    geometry: PlaneGeometry,
    pixel_type: PixelType,
}

impl AlignedBuffer {
    pub fn allocate(geometry: PlaneGeometry, pixel_type: PixelType) -> Result<Self, BenchError> {
        let row_bytes = (geometry.width as usize).checked_mul(pixel_type.bytes_per_sample());
        let stride = row_bytes.and_then(aligned_stride);
        let len = stride.and_then(|stride| stride.checked_mul(geometry.height as usize));
        match (stride, len) {
            (Some(stride), Some(len)) => Self::zeroed(len, stride, geometry, pixel_type),
            _ => Err(BenchError::OutOfMemory { bytes: usize::MAX }),
        }
    }

    /// Single-row byte region used as stage scratch memory.
    pub fn scratch(bytes: usize) -> Result<Self, BenchError> {
        let stride = aligned_stride(bytes).ok_or(BenchError::OutOfMemory { bytes })?;
        let width = u32::try_from(bytes).map_err(|_| BenchError::OutOfMemory { bytes })?;
        Self::zeroed(stride, stride, PlaneGeometry::new(width, 1), PixelType::Byte)
    }

    fn zeroed(
        len: usize,
        stride: usize,
        geometry: PlaneGeometry,
        pixel_type: PixelType,
    ) -> Result<Self, BenchError> {
        let count = len / ALIGNMENT;
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(count)
            .map_err(|_| BenchError::OutOfMemory { bytes: len })?;
        blocks.resize(count, Block::zeroed());
        Ok(Self {
            blocks,
            len,
            stride,
            geometry,
            pixel_type,
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn geometry(&self) -> PlaneGeometry {
        self.geometry
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len]
    }

    pub fn plane(&self) -> Result<PlaneRef<'_>, EngineError> {
        PlaneRef::new(self.as_bytes(), self.stride, self.geometry, self.pixel_type)
    }

    pub fn plane_mut(&mut self) -> Result<PlaneMut<'_>, EngineError> {
        let (stride, geometry, pixel_type) = (self.stride, self.geometry, self.pixel_type);
        PlaneMut::new(self.as_bytes_mut(), stride, geometry, pixel_type)
    }
}

/// Every plane one worker touches during a pipeline run. Never shared between threads.
pub struct WorkerBuffers {
    pub src_y: AlignedBuffer,
    pub src_u: AlignedBuffer,
    pub src_v: AlignedBuffer,
    pub wide_y: AlignedBuffer,
    pub wide_u: AlignedBuffer,
    pub wide_v: AlignedBuffer,
    pub full_u: AlignedBuffer,
    pub full_v: AlignedBuffer,
    pub scaled_y: AlignedBuffer,
    pub scaled_u: AlignedBuffer,
    pub scaled_v: AlignedBuffer,
    pub dst_y: AlignedBuffer,
    pub dst_u: AlignedBuffer,
    pub dst_v: AlignedBuffer,
    pub scratch: AlignedBuffer,
}

impl WorkerBuffers {
    pub fn allocate(config: &BenchmarkConfig, scratch_size: usize) -> Result<Self, BenchError> {
        let float = config.intermediate_type();
        let plane = AlignedBuffer::allocate;
        Ok(Self {
            src_y: plane(config.source, PixelType::Word)?,
            src_u: plane(config.chroma, PixelType::Word)?,
            src_v: plane(config.chroma, PixelType::Word)?,
            wide_y: plane(config.source, float)?,
            wide_u: plane(config.chroma, float)?,
            wide_v: plane(config.chroma, float)?,
            full_u: plane(config.source, float)?,
            full_v: plane(config.source, float)?,
            scaled_y: plane(config.destination, float)?,
            scaled_u: plane(config.destination, float)?,
            scaled_v: plane(config.destination, float)?,
            dst_y: plane(config.destination, PixelType::Byte)?,
            dst_u: plane(config.destination, PixelType::Byte)?,
            dst_v: plane(config.destination, PixelType::Byte)?,
            scratch: AlignedBuffer::scratch(scratch_size)?,
        })
    }

    pub fn total_bytes(&self) -> usize {
        [
            &self.src_y,
            &self.src_u,
            &self.src_v,
            &self.wide_y,
            &self.wide_u,
            &self.wide_v,
            &self.full_u,
            &self.full_v,
            &self.scaled_y,
            &self.scaled_u,
            &self.scaled_v,
            &self.dst_y,
            &self.dst_u,
            &self.dst_v,
            &self.scratch,
        ]
        .iter()
        .map(|buffer| buffer.len())
        .sum()
    }
}
