use crate::{
    ColorspaceParams, ColorspaceStage, DepthStage, DitherType, EngineError, NativeColorspace,
    NativeDepth, NativeResize, ResizeParams, ResizeStage, StageFactory,
};

/// Portable scalar implementation of every stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeEngine;

impl StageFactory for NativeEngine {
    fn create_depth(&self, dither: DitherType) -> Result<Box<dyn DepthStage>, EngineError> {
        Ok(Box::new(NativeDepth::new(dither)))
    }

    fn create_resize(&self, params: &ResizeParams) -> Result<Box<dyn ResizeStage>, EngineError> {
        Ok(Box::new(NativeResize::new(params)?))
    }

    fn create_colorspace(
        &self,
        params: &ColorspaceParams,
    ) -> Result<Box<dyn ColorspaceStage>, EngineError> {
        Ok(Box::new(NativeColorspace::new(params)?))
    }
}
