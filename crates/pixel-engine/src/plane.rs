use crate::EngineError;
use common::{PixelType, PlaneGeometry};
use half::f16;
use half::slice::HalfFloatSliceExt;

/// Read-only view of one plane: `height` rows of `width` samples, `stride` bytes apart.
#[derive(Clone, Copy, Debug)]
pub struct PlaneRef<'a> {
    data: &'a [u8],
    stride: usize,
    geometry: PlaneGeometry,
    pixel_type: PixelType,
}

#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    stride: usize,
    geometry: PlaneGeometry,
    pixel_type: PixelType,
}

fn validate_layout(
    len: usize,
    stride: usize,
    geometry: PlaneGeometry,
    pixel_type: PixelType,
) -> Result<(), EngineError> {
    let row_bytes = geometry.width as usize * pixel_type.bytes_per_sample();
    if stride < row_bytes {
        return Err(EngineError::InvalidStride { stride, row_bytes });
    }
    let required = match geometry.height as usize {
        0 => 0,
        rows => stride * (rows - 1) + row_bytes,
    };
    if len < required {
        return Err(EngineError::BufferTooSmall {
            required,
            available: len,
        });
    }
    Ok(())
}

impl<'a> PlaneRef<'a> {
    pub fn new(
        data: &'a [u8],
        stride: usize,
        geometry: PlaneGeometry,
        pixel_type: PixelType,
    ) -> Result<Self, EngineError> {
        validate_layout(data.len(), stride, geometry, pixel_type)?;
        Ok(Self {
            data,
            stride,
            geometry,
            pixel_type,
        })
    }

    pub fn geometry(&self) -> PlaneGeometry {
        self.geometry
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        let row_bytes = self.geometry.width as usize * self.pixel_type.bytes_per_sample();
        &self.data[start..start + row_bytes]
    }
}

impl<'a> PlaneMut<'a> {
    pub fn new(
        data: &'a mut [u8],
        stride: usize,
        geometry: PlaneGeometry,
        pixel_type: PixelType,
    ) -> Result<Self, EngineError> {
        validate_layout(data.len(), stride, geometry, pixel_type)?;
        Ok(Self {
            data,
            stride,
            geometry,
            pixel_type,
        })
    }

    pub fn geometry(&self) -> PlaneGeometry {
        self.geometry
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_plane_ref(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: &*self.data,
            stride: self.stride,
            geometry: self.geometry,
            pixel_type: self.pixel_type,
        }
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        let row_bytes = self.geometry.width as usize * self.pixel_type.bytes_per_sample();
        &self.data[start..start + row_bytes]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        let row_bytes = self.geometry.width as usize * self.pixel_type.bytes_per_sample();
        &mut self.data[start..start + row_bytes]
    }
}

pub(crate) fn expect_geometry(
    expected: PlaneGeometry,
    found: PlaneGeometry,
) -> Result<(), EngineError> {
    if expected != found {
        return Err(EngineError::GeometryMismatch { expected, found });
    }
    Ok(())
}

/// Carves `len` f32 values out of the front of a scratch region.
pub(crate) fn scratch_f32(scratch: &mut [u8], len: usize) -> Result<&mut [f32], EngineError> {
    let required = len * std::mem::size_of::<f32>();
    if scratch.len() < required {
        return Err(EngineError::ScratchTooSmall {
            required,
            available: scratch.len(),
        });
    }
    bytemuck::try_cast_slice_mut(&mut scratch[..required])
        .map_err(|_| EngineError::Misaligned(PixelType::Float))
}

/// Widens one row of raw samples into `out` without any range scaling.
pub(crate) fn load_row(
    row: &[u8],
    pixel_type: PixelType,
    out: &mut [f32],
) -> Result<(), EngineError> {
    match pixel_type {
        PixelType::Byte => {
            for (dst, &src) in out.iter_mut().zip(row) {
                *dst = f32::from(src);
            }
        }
        PixelType::Word => {
            let samples: &[u16] =
                bytemuck::try_cast_slice(row).map_err(|_| EngineError::Misaligned(pixel_type))?;
            for (dst, &src) in out.iter_mut().zip(samples) {
                *dst = f32::from(src);
            }
        }
        PixelType::Half => {
            let samples: &[f16] =
                bytemuck::try_cast_slice(row).map_err(|_| EngineError::Misaligned(pixel_type))?;
            samples.convert_to_f32_slice(&mut out[..samples.len()]);
        }
        PixelType::Float => {
            let samples: &[f32] =
                bytemuck::try_cast_slice(row).map_err(|_| EngineError::Misaligned(pixel_type))?;
            out[..samples.len()].copy_from_slice(samples);
        }
    }
    Ok(())
}

/// Narrows `values` into one row of raw samples; integer types round and saturate.
pub(crate) fn store_row(
    values: &[f32],
    pixel_type: PixelType,
    row: &mut [u8],
) -> Result<(), EngineError> {
    match pixel_type {
        PixelType::Byte => {
            for (dst, &src) in row.iter_mut().zip(values) {
                *dst = src.round().clamp(0.0, f32::from(u8::MAX)) as u8;
            }
        }
        PixelType::Word => {
            let samples: &mut [u16] = bytemuck::try_cast_slice_mut(row)
                .map_err(|_| EngineError::Misaligned(pixel_type))?;
            for (dst, &src) in samples.iter_mut().zip(values) {
                *dst = src.round().clamp(0.0, f32::from(u16::MAX)) as u16;
            }
        }
        PixelType::Half => {
            let samples: &mut [f16] = bytemuck::try_cast_slice_mut(row)
                .map_err(|_| EngineError::Misaligned(pixel_type))?;
            let len = samples.len();
            samples.convert_from_f32_slice(&values[..len]);
        }
        PixelType::Float => {
            let samples: &mut [f32] = bytemuck::try_cast_slice_mut(row)
                .map_err(|_| EngineError::Misaligned(pixel_type))?;
            let len = samples.len();
            samples.copy_from_slice(&values[..len]);
        }
    }
    Ok(())
}
