use crate::plane::{PlaneMut, PlaneRef, expect_geometry, load_row, scratch_f32, store_row};
use crate::{DepthArgs, DepthStage, DitherType, EngineError, SampleRange};
use common::PixelType;

const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Sample-format conversion between integer ranges and normalised floating point.
#[derive(Clone, Copy, Debug)]
pub struct NativeDepth {
    dither: DitherType,
}

impl NativeDepth {
    pub fn new(dither: DitherType) -> Self {
        Self { dither }
    }

    fn dither_offset(&self, x: usize, y: usize) -> f32 {
        match self.dither {
            DitherType::None => 0.0,
            DitherType::Ordered => f32::from(BAYER_4X4[y & 3][x & 3]) / 16.0 - 15.0 / 32.0,
        }
    }
}

/// `(offset, scale)` mapping normalised values onto an integer code range.
fn integer_range(range: SampleRange, chroma: bool) -> (f32, f32) {
    let depth = i32::from(range.depth);
    if range.full_range {
        let peak = ((1_u32 << range.depth) - 1) as f32;
        let offset = if chroma {
            (1_u32 << (range.depth - 1)) as f32
        } else {
            0.0
        };
        (offset, peak)
    } else {
        let unit = 2.0_f32.powi(depth - 8);
        if chroma {
            (128.0 * unit, 224.0 * unit)
        } else {
            (16.0 * unit, 219.0 * unit)
        }
    }
}

fn validate_range(pixel_type: PixelType, range: SampleRange) -> Result<(), EngineError> {
    let max_depth = match pixel_type {
        PixelType::Byte => 8,
        PixelType::Word => 16,
        PixelType::Half | PixelType::Float => return Ok(()),
    };
    if range.depth == 0 || range.depth > max_depth {
        return Err(EngineError::invalid(
            "depth",
            format!(
                "{} bits does not fit {:?} samples",
                range.depth, pixel_type
            ),
        ));
    }
    Ok(())
}

impl DepthStage for NativeDepth {
    fn scratch_size(&self, width: u32) -> usize {
        width as usize * std::mem::size_of::<f32>()
    }

    fn process(
        &self,
        src: &PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [u8],
        args: &DepthArgs,
    ) -> Result<(), EngineError> {
        expect_geometry(src.geometry(), dst.geometry())?;
        validate_range(src.pixel_type(), args.input)?;
        validate_range(dst.pixel_type(), args.output)?;

        let geometry = src.geometry();
        let width = geometry.width as usize;
        let row = scratch_f32(scratch, width)?;

        let input = src
            .pixel_type()
            .is_integer()
            .then(|| integer_range(args.input, args.chroma));
        let output = dst
            .pixel_type()
            .is_integer()
            .then(|| integer_range(args.output, args.chroma));
        let peak = ((1_u32 << args.output.depth.min(16)) - 1) as f32;

        for y in 0..geometry.height as usize {
            load_row(src.row(y), src.pixel_type(), row)?;
            if let Some((offset, scale)) = input {
                for value in row.iter_mut() {
                    *value = (*value - offset) / scale;
                }
            }
            if let Some((offset, scale)) = output {
                for (x, value) in row.iter_mut().enumerate() {
                    let code = *value * scale + offset + self.dither_offset(x, y);
                    *value = code.round().clamp(0.0, peak);
                }
            }
            store_row(row, dst.pixel_type(), dst.row_mut(y))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NativeDepth;
    use crate::{DepthArgs, DepthStage, DitherType, PlaneMut, PlaneRef, SampleRange};
    use common::{PixelType, PlaneGeometry};

    fn limited_8bit() -> SampleRange {
        SampleRange {
            depth: 8,
            full_range: false,
        }
    }

    fn full_8bit() -> SampleRange {
        SampleRange {
            depth: 8,
            full_range: true,
        }
    }

    #[test]
    fn limited_range_luma_widens_to_unit_interval() {
        let depth = NativeDepth::new(DitherType::None);
        let geometry = PlaneGeometry::new(3, 1);
        let src_words = [16_u16, 126, 235];
        let mut dst_floats = [0.0_f32; 3];
        let mut scratch = vec![0.0_f32; 3];

        let src = PlaneRef::new(bytemuck::cast_slice(&src_words[..]), 6, geometry, PixelType::Word)
            .expect("src plane");
        let mut dst = PlaneMut::new(
            bytemuck::cast_slice_mut(&mut dst_floats[..]),
            12,
            geometry,
            PixelType::Float,
        )
        .expect("dst plane");
        let args = DepthArgs {
            input: limited_8bit(),
            output: full_8bit(),
            chroma: false,
        };
        depth
            .process(&src, &mut dst, bytemuck::cast_slice_mut(&mut scratch[..]), &args)
            .expect("widen");

        assert_eq!(dst_floats[0], 0.0);
        assert!((dst_floats[1] - 110.0 / 219.0).abs() < 1e-6);
        assert_eq!(dst_floats[2], 1.0);
    }

    #[test]
    fn full_range_chroma_narrows_around_midpoint() {
        let depth = NativeDepth::new(DitherType::None);
        let geometry = PlaneGeometry::new(3, 1);
        let src_floats = [-128.0_f32 / 255.0, 0.0, 127.0 / 255.0];
        let mut dst_bytes = [0_u8; 3];
        let mut scratch = vec![0.0_f32; 3];

        let src = PlaneRef::new(
            bytemuck::cast_slice(&src_floats[..]),
            12,
            geometry,
            PixelType::Float,
        )
        .expect("src plane");
        let mut dst =
            PlaneMut::new(&mut dst_bytes, 3, geometry, PixelType::Byte).expect("dst plane");
        let args = DepthArgs {
            input: full_8bit(),
            output: full_8bit(),
            chroma: true,
        };
        depth
            .process(&src, &mut dst, bytemuck::cast_slice_mut(&mut scratch[..]), &args)
            .expect("narrow");

        assert_eq!(dst_bytes, [0, 128, 255]);
    }

    #[test]
    fn ordered_dither_stays_within_one_code() {
        let depth = NativeDepth::new(DitherType::Ordered);
        let geometry = PlaneGeometry::new(4, 4);
        let src_floats = [0.5_f32; 16];
        let mut dst_bytes = [0_u8; 16];
        let mut scratch = vec![0.0_f32; 4];

        let src = PlaneRef::new(
            bytemuck::cast_slice(&src_floats[..]),
            16,
            geometry,
            PixelType::Float,
        )
        .expect("src plane");
        let mut dst =
            PlaneMut::new(&mut dst_bytes, 4, geometry, PixelType::Byte).expect("dst plane");
        let args = DepthArgs {
            input: full_8bit(),
            output: full_8bit(),
            chroma: false,
        };
        depth
            .process(&src, &mut dst, bytemuck::cast_slice_mut(&mut scratch[..]), &args)
            .expect("narrow");

        assert!(dst_bytes.iter().all(|&code| (127..=128).contains(&code)));
        assert!(dst_bytes.contains(&127));
        assert!(dst_bytes.contains(&128));
    }

    #[test]
    fn depth_rejects_bits_wider_than_sample() {
        let depth = NativeDepth::new(DitherType::None);
        let geometry = PlaneGeometry::new(1, 1);
        let src_floats = [0.0_f32];
        let mut dst_bytes = [0_u8; 1];
        let mut scratch = vec![0.0_f32; 1];

        let src = PlaneRef::new(bytemuck::cast_slice(&src_floats[..]), 4, geometry, PixelType::Float)
            .expect("src plane");
        let mut dst =
            PlaneMut::new(&mut dst_bytes, 1, geometry, PixelType::Byte).expect("dst plane");
        let args = DepthArgs {
            input: full_8bit(),
            output: SampleRange {
                depth: 10,
                full_range: true,
            },
            chroma: false,
        };
        assert!(
            depth
                .process(&src, &mut dst, bytemuck::cast_slice_mut(&mut scratch[..]), &args)
                .is_err()
        );
    }
}
