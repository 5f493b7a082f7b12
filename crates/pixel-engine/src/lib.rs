#![forbid(unsafe_code)]

//! Pixel-processing stages used by the scaling benchmark.
//!
//! Every stage follows the same lifecycle: it is built once through a
//! [`StageFactory`], reports how much scratch memory an invocation needs, and
//! can then be invoked concurrently from any number of threads as long as each
//! caller brings its own planes and scratch region.

mod colorspace;
mod depth;
mod error;
mod native;
mod plane;
mod resize;

use auto_impl::auto_impl;
use common::{ColorDescription, PixelType, PlaneGeometry};

pub use colorspace::NativeColorspace;
pub use depth::NativeDepth;
pub use error::EngineError;
pub use native::NativeEngine;
pub use plane::{PlaneMut, PlaneRef};
pub use resize::NativeResize;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DitherType {
    #[default]
    None,
    Ordered,
}

/// Integer code range of a sample format. Ignored for floating point planes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SampleRange {
    pub depth: u8,
    pub full_range: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DepthArgs {
    pub input: SampleRange,
    pub output: SampleRange,
    pub chroma: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeFilter {
    Point,
    Bilinear,
    Lanczos { taps: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeParams {
    pub filter: ResizeFilter,
    pub src: PlaneGeometry,
    pub dst: PlaneGeometry,
    pub shift_x: f64,
    pub shift_y: f64,
    pub active_width: f64,
    pub active_height: f64,
}

impl ResizeParams {
    pub fn new(filter: ResizeFilter, src: PlaneGeometry, dst: PlaneGeometry) -> Self {
        Self {
            filter,
            src,
            dst,
            shift_x: 0.0,
            shift_y: 0.0,
            active_width: f64::from(src.width),
            active_height: f64::from(src.height),
        }
    }

    pub fn with_shift(mut self, shift_x: f64, shift_y: f64) -> Self {
        self.shift_x = shift_x;
        self.shift_y = shift_y;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColorspaceParams {
    pub input: ColorDescription,
    pub output: ColorDescription,
}

pub trait DepthStage: Send + Sync {
    fn scratch_size(&self, width: u32) -> usize;

    fn process(
        &self,
        src: &PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [u8],
        args: &DepthArgs,
    ) -> Result<(), EngineError>;
}

pub trait ResizeStage: Send + Sync {
    fn scratch_size(&self, pixel_type: PixelType) -> usize;

    fn process(
        &self,
        src: &PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [u8],
    ) -> Result<(), EngineError>;
}

/// Converts three planes in place.
pub trait ColorspaceStage: Send + Sync {
    fn scratch_size(&self, width: u32) -> usize;

    fn process(&self, planes: [&mut PlaneMut<'_>; 3], scratch: &mut [u8])
    -> Result<(), EngineError>;
}

#[auto_impl(&, Box, Arc)]
pub trait StageFactory: Send + Sync {
    fn create_depth(&self, dither: DitherType) -> Result<Box<dyn DepthStage>, EngineError>;

    fn create_resize(&self, params: &ResizeParams) -> Result<Box<dyn ResizeStage>, EngineError>;

    fn create_colorspace(
        &self,
        params: &ColorspaceParams,
    ) -> Result<Box<dyn ColorspaceStage>, EngineError>;
}
