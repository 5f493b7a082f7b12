use crate::plane::{PlaneMut, expect_geometry, load_row, scratch_f32, store_row};
use crate::{ColorspaceParams, ColorspaceStage, EngineError};
use common::ColorMatrix;

type Matrix3 = [[f32; 3]; 3];

const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn ycbcr_to_rgb(matrix: ColorMatrix) -> Matrix3 {
    let Some((kr, kb)) = matrix.luma_coefficients() else {
        return IDENTITY;
    };
    let kg = 1.0 - kr - kb;
    [
        [1.0, 0.0, 2.0 * (1.0 - kr)],
        [
            1.0,
            -2.0 * kb * (1.0 - kb) / kg,
            -2.0 * kr * (1.0 - kr) / kg,
        ],
        [1.0, 2.0 * (1.0 - kb), 0.0],
    ]
}

fn rgb_to_ycbcr(matrix: ColorMatrix) -> Matrix3 {
    let Some((kr, kb)) = matrix.luma_coefficients() else {
        return IDENTITY;
    };
    let kg = 1.0 - kr - kb;
    let cb = 2.0 * (1.0 - kb);
    let cr = 2.0 * (1.0 - kr);
    [
        [kr, kg, kb],
        [-kr / cb, -kg / cb, (1.0 - kb) / cb],
        [(1.0 - kr) / cr, -kg / cr, -kb / cr],
    ]
}

fn multiply(lhs: &Matrix3, rhs: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, cell) in out_row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| lhs[row][k] * rhs[k][col]).sum();
        }
    }
    out
}

/// In-place 3x3 matrix conversion across three equally sized planes.
#[derive(Clone, Debug)]
pub struct NativeColorspace {
    matrix: Matrix3,
}

impl NativeColorspace {
    pub fn new(params: &ColorspaceParams) -> Result<Self, EngineError> {
        if params.input.transfer != params.output.transfer {
            return Err(EngineError::Unsupported(format!(
                "transfer {:?} -> {:?}",
                params.input.transfer, params.output.transfer
            )));
        }
        if params.input.primaries != params.output.primaries {
            return Err(EngineError::Unsupported(format!(
                "primaries {:?} -> {:?}",
                params.input.primaries, params.output.primaries
            )));
        }
        let to_rgb = ycbcr_to_rgb(params.input.matrix);
        let from_rgb = rgb_to_ycbcr(params.output.matrix);
        Ok(Self {
            matrix: multiply(&from_rgb, &to_rgb),
        })
    }
}

impl ColorspaceStage for NativeColorspace {
    fn scratch_size(&self, width: u32) -> usize {
        3 * width as usize * std::mem::size_of::<f32>()
    }

    fn process(
        &self,
        planes: [&mut PlaneMut<'_>; 3],
        scratch: &mut [u8],
    ) -> Result<(), EngineError> {
        let [first, second, third] = planes;
        let geometry = first.geometry();
        expect_geometry(geometry, second.geometry())?;
        expect_geometry(geometry, third.geometry())?;
        for plane in [&*second, &*third] {
            if plane.pixel_type() != first.pixel_type() {
                return Err(EngineError::PixelTypeMismatch {
                    expected: first.pixel_type(),
                    found: plane.pixel_type(),
                });
            }
        }

        let width = geometry.width as usize;
        let floats = scratch_f32(scratch, 3 * width)?;
        let (a, rest) = floats.split_at_mut(width);
        let (b, c) = rest.split_at_mut(width);
        let m = &self.matrix;

        for y in 0..geometry.height as usize {
            load_row(first.row(y), first.pixel_type(), a)?;
            load_row(second.row(y), second.pixel_type(), b)?;
            load_row(third.row(y), third.pixel_type(), c)?;
            for x in 0..width {
                let (p0, p1, p2) = (a[x], b[x], c[x]);
                a[x] = m[0][0] * p0 + m[0][1] * p1 + m[0][2] * p2;
                b[x] = m[1][0] * p0 + m[1][1] * p1 + m[1][2] * p2;
                c[x] = m[2][0] * p0 + m[2][1] * p1 + m[2][2] * p2;
            }
            store_row(a, first.pixel_type(), first.row_mut(y))?;
            store_row(b, second.pixel_type(), second.row_mut(y))?;
            store_row(c, third.pixel_type(), third.row_mut(y))?;
        }
        Ok(())
    }
}
