use crate::plane::{PlaneMut, PlaneRef, expect_geometry, load_row, scratch_f32, store_row};
use crate::{EngineError, ResizeFilter, ResizeParams, ResizeStage};
use common::{PixelType, PlaneGeometry};
use std::f64::consts::PI;

/// Sparse row of filter weights for every output sample along one axis.
#[derive(Clone, Debug)]
struct FilterBank {
    offsets: Vec<usize>,
    indices: Vec<usize>,
    weights: Vec<f32>,
}

impl FilterBank {
    fn taps(&self, output: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let range = self.offsets[output]..self.offsets[output + 1];
        self.indices[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    fn build(
        filter: ResizeFilter,
        src_dim: u32,
        dst_dim: u32,
        shift: f64,
        active_dim: f64,
    ) -> Self {
        let step = active_dim / f64::from(dst_dim);
        let widen = step.max(1.0);
        let support = filter.support() * widen;
        let last = i64::from(src_dim) - 1;

        let mut offsets = Vec::with_capacity(dst_dim as usize + 1);
        let mut indices = Vec::new();
        let mut weights = Vec::new();
        offsets.push(0);

        for output in 0..dst_dim {
            let center = shift + (f64::from(output) + 0.5) * step - 0.5;
            let first = (center - support).floor() as i64;
            let end = (center + support).ceil() as i64;
            let start = weights.len();

            let mut total = 0.0;
            for tap in first..=end {
                let weight = filter.evaluate((tap as f64 - center) / widen);
                if weight == 0.0 {
                    continue;
                }
                indices.push(tap.clamp(0, last) as usize);
                weights.push(weight as f32);
                total += weight;
            }

            if total == 0.0 {
                indices.truncate(start);
                weights.truncate(start);
                indices.push(center.round().clamp(0.0, last as f64) as usize);
                weights.push(1.0);
            } else {
                for weight in &mut weights[start..] {
                    *weight = (f64::from(*weight) / total) as f32;
                }
            }
            offsets.push(weights.len());
        }

        Self {
            offsets,
            indices,
            weights,
        }
    }
}

impl ResizeFilter {
    fn support(self) -> f64 {
        match self {
            Self::Point => 0.5,
            Self::Bilinear => 1.0,
            Self::Lanczos { taps } => f64::from(taps),
        }
    }

    fn evaluate(self, x: f64) -> f64 {
        match self {
            Self::Point => {
                if (-0.5..0.5).contains(&x) {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Bilinear => (1.0 - x.abs()).max(0.0),
            Self::Lanczos { taps } => {
                let a = f64::from(taps);
                if x.abs() >= a {
                    0.0
                } else {
                    sinc(x) * sinc(x / a)
                }
            }
        }
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Separable resampler: horizontal pass into scratch, then vertical pass into the destination.
#[derive(Clone, Debug)]
pub struct NativeResize {
    src: PlaneGeometry,
    dst: PlaneGeometry,
    horizontal: FilterBank,
    vertical: FilterBank,
}

impl NativeResize {
    pub fn new(params: &ResizeParams) -> Result<Self, EngineError> {
        if params.src.is_empty() {
            return Err(EngineError::invalid("src", "source dimensions must be non-zero"));
        }
        if params.dst.is_empty() {
            return Err(EngineError::invalid(
                "dst",
                "destination dimensions must be non-zero",
            ));
        }
        if let ResizeFilter::Lanczos { taps: 0 } = params.filter {
            return Err(EngineError::invalid("taps", "lanczos needs at least one tap"));
        }
        if !params.shift_x.is_finite() || !params.shift_y.is_finite() {
            return Err(EngineError::invalid("shift", "subpixel shift must be finite"));
        }
        if !(params.active_width.is_finite() && params.active_width > 0.0)
            || !(params.active_height.is_finite() && params.active_height > 0.0)
        {
            return Err(EngineError::invalid(
                "active window",
                "active window must be positive and finite",
            ));
        }

        Ok(Self {
            src: params.src,
            dst: params.dst,
            horizontal: FilterBank::build(
                params.filter,
                params.src.width,
                params.dst.width,
                params.shift_x,
                params.active_width,
            ),
            vertical: FilterBank::build(
                params.filter,
                params.src.height,
                params.dst.height,
                params.shift_y,
                params.active_height,
            ),
        })
    }

    fn scratch_floats(&self) -> usize {
        let src_w = self.src.width as usize;
        let dst_w = self.dst.width as usize;
        src_w + dst_w * self.src.height as usize + dst_w
    }
}

impl ResizeStage for NativeResize {
    fn scratch_size(&self, _pixel_type: PixelType) -> usize {
        self.scratch_floats() * std::mem::size_of::<f32>()
    }

    fn process(
        &self,
        src: &PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [u8],
    ) -> Result<(), EngineError> {
        expect_geometry(self.src, src.geometry())?;
        expect_geometry(self.dst, dst.geometry())?;
        if src.pixel_type() != dst.pixel_type() {
            return Err(EngineError::PixelTypeMismatch {
                expected: src.pixel_type(),
                found: dst.pixel_type(),
            });
        }

        let src_w = self.src.width as usize;
        let dst_w = self.dst.width as usize;
        let floats = scratch_f32(scratch, self.scratch_floats())?;
        let (src_row, rest) = floats.split_at_mut(src_w);
        let (transposed, dst_row) = rest.split_at_mut(dst_w * self.src.height as usize);

        for y in 0..self.src.height as usize {
            load_row(src.row(y), src.pixel_type(), src_row)?;
            let out = &mut transposed[y * dst_w..(y + 1) * dst_w];
            for (x, value) in out.iter_mut().enumerate() {
                *value = self
                    .horizontal
                    .taps(x)
                    .map(|(index, weight)| src_row[index] * weight)
                    .sum();
            }
        }

        for y in 0..self.dst.height as usize {
            dst_row.fill(0.0);
            for (index, weight) in self.vertical.taps(y) {
                let line = &transposed[index * dst_w..(index + 1) * dst_w];
                for (acc, &value) in dst_row.iter_mut().zip(line) {
                    *acc += value * weight;
                }
            }
            store_row(dst_row, dst.pixel_type(), dst.row_mut(y))?;
        }
        Ok(())
    }
}
