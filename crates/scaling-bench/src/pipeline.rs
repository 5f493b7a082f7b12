use crate::buffer::{AlignedBuffer, WorkerBuffers};
use crate::error::{BenchError, PipelineStage};
use common::BenchmarkConfig;
use pixel_engine::{
    ColorspaceParams, ColorspaceStage, DepthArgs, DepthStage, DitherType, EngineError,
    ResizeFilter, ResizeParams, ResizeStage, SampleRange, StageFactory,
};

const LANCZOS_TAPS: u32 = 4;
/// Left-sited chroma sits a quarter of a luma sample off the chroma grid.
const CHROMA_SHIFT_X: f64 = 0.25;

const SOURCE_RANGE: SampleRange = SampleRange {
    depth: 8,
    full_range: false,
};
const FLOAT_RANGE: SampleRange = SampleRange {
    depth: 32,
    full_range: true,
};
const OUTPUT_RANGE: SampleRange = SampleRange {
    depth: 8,
    full_range: true,
};

/// The five processing stages, built once and invoked concurrently by every worker.
pub struct PipelineHandle {
    config: BenchmarkConfig,
    widen: Box<dyn DepthStage>,
    upsample: Box<dyn ResizeStage>,
    color: Box<dyn ColorspaceStage>,
    resample: Box<dyn ResizeStage>,
    narrow: Box<dyn DepthStage>,
    scratch_size: usize,
}

impl PipelineHandle {
    pub fn new(factory: &dyn StageFactory, config: &BenchmarkConfig) -> Result<Self, BenchError> {
        let widen = factory
            .create_depth(DitherType::Ordered)
            .map_err(BenchError::construction(PipelineStage::Widen))?;
        let upsample = factory
            .create_resize(
                &ResizeParams::new(
                    ResizeFilter::Lanczos {
                        taps: LANCZOS_TAPS,
                    },
                    config.chroma,
                    config.source,
                )
                .with_shift(CHROMA_SHIFT_X, 0.0),
            )
            .map_err(BenchError::construction(PipelineStage::Upsample))?;
        let color = factory
            .create_colorspace(&ColorspaceParams {
                input: config.source_color,
                output: config.destination_color,
            })
            .map_err(BenchError::construction(PipelineStage::ColorTransform))?;
        let resample = factory
            .create_resize(&ResizeParams::new(
                ResizeFilter::Lanczos {
                    taps: LANCZOS_TAPS,
                },
                config.source,
                config.destination,
            ))
            .map_err(BenchError::construction(PipelineStage::Resample))?;
        let narrow = factory
            .create_depth(DitherType::Ordered)
            .map_err(BenchError::construction(PipelineStage::Narrow))?;

        let float = config.intermediate_type();
        let scratch_size = [
            widen.scratch_size(config.source.width),
            widen.scratch_size(config.chroma.width),
            upsample.scratch_size(float),
            color.scratch_size(config.source.width),
            resample.scratch_size(float),
            narrow.scratch_size(config.destination.width),
        ]
        .into_iter()
        .max()
        .unwrap_or_default();

        tracing::debug!(
            precision = config.precision.as_str(),
            scratch_size,
            "pipeline constructed"
        );

        Ok(Self {
            config: config.clone(),
            widen,
            upsample,
            color,
            resample,
            narrow,
            scratch_size,
        })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Bytes of scratch memory each worker must provide.
    pub fn scratch_size(&self) -> usize {
        self.scratch_size
    }

    /// Runs one full pipeline pass over a worker's private buffers.
    pub fn execute(&self, buffers: &mut WorkerBuffers) -> Result<(), BenchError> {
        let WorkerBuffers {
            src_y,
            src_u,
            src_v,
            wide_y,
            wide_u,
            wide_v,
            full_u,
            full_v,
            scaled_y,
            scaled_u,
            scaled_v,
            dst_y,
            dst_u,
            dst_v,
            scratch,
        } = buffers;

        for (src, dst, chroma) in [
            (&*src_y, &mut *wide_y, false),
            (&*src_u, &mut *wide_u, true),
            (&*src_v, &mut *wide_v, true),
        ] {
            let args = DepthArgs {
                input: SOURCE_RANGE,
                output: FLOAT_RANGE,
                chroma,
            };
            depth(&*self.widen, src, dst, scratch, &args)
                .map_err(BenchError::invocation(PipelineStage::Widen))?;
        }

        for (src, dst) in [(&*wide_u, &mut *full_u), (&*wide_v, &mut *full_v)] {
            resize(&*self.upsample, src, dst, scratch)
                .map_err(BenchError::invocation(PipelineStage::Upsample))?;
        }

        color(&*self.color, [&mut *wide_y, &mut *full_u, &mut *full_v], scratch)
            .map_err(BenchError::invocation(PipelineStage::ColorTransform))?;

        for (src, dst) in [
            (&*wide_y, &mut *scaled_y),
            (&*full_u, &mut *scaled_u),
            (&*full_v, &mut *scaled_v),
        ] {
            resize(&*self.resample, src, dst, scratch)
                .map_err(BenchError::invocation(PipelineStage::Resample))?;
        }

        // Planes hold RGB after the color transform, so none of them is chroma.
        for (src, dst) in [
            (&*scaled_y, &mut *dst_y),
            (&*scaled_u, &mut *dst_u),
            (&*scaled_v, &mut *dst_v),
        ] {
            let args = DepthArgs {
                input: FLOAT_RANGE,
                output: OUTPUT_RANGE,
                chroma: false,
            };
            depth(&*self.narrow, src, dst, scratch, &args)
                .map_err(BenchError::invocation(PipelineStage::Narrow))?;
        }
        Ok(())
    }
}

fn depth(
    stage: &dyn DepthStage,
    src: &AlignedBuffer,
    dst: &mut AlignedBuffer,
    scratch: &mut AlignedBuffer,
    args: &DepthArgs,
) -> Result<(), EngineError> {
    let src = src.plane()?;
    let mut dst = dst.plane_mut()?;
    stage.process(&src, &mut dst, scratch.as_bytes_mut(), args)
}

fn resize(
    stage: &dyn ResizeStage,
    src: &AlignedBuffer,
    dst: &mut AlignedBuffer,
    scratch: &mut AlignedBuffer,
) -> Result<(), EngineError> {
    let src = src.plane()?;
    let mut dst = dst.plane_mut()?;
    stage.process(&src, &mut dst, scratch.as_bytes_mut())
}

fn color(
    stage: &dyn ColorspaceStage,
    planes: [&mut AlignedBuffer; 3],
    scratch: &mut AlignedBuffer,
) -> Result<(), EngineError> {
    let [first, second, third] = planes;
    let mut first = first.plane_mut()?;
    let mut second = second.plane_mut()?;
    let mut third = third.plane_mut()?;
    stage.process([&mut first, &mut second, &mut third], scratch.as_bytes_mut())
}

#[cfg(test)]
mod tests {
    use super::PipelineHandle;
    use crate::WorkerBuffers;
    use common::{BenchmarkConfig, PlaneGeometry, SamplePrecision};
    use pixel_engine::NativeEngine;

    fn small_config(precision: SamplePrecision) -> BenchmarkConfig {
        BenchmarkConfig {
            source: PlaneGeometry::new(32, 16),
            chroma: PlaneGeometry::new(16, 8),
            destination: PlaneGeometry::new(48, 24),
            precision,
            work_items_per_thread: 1,
            ..BenchmarkConfig::default()
        }
    }

    #[test]
    fn scratch_size_covers_largest_stage() {
        let config = small_config(SamplePrecision::Float);
        let pipeline = PipelineHandle::new(&NativeEngine, &config).expect("pipeline");
        // Output resampler keeps a 48x16 float intermediate plus two rows.
        assert_eq!(pipeline.scratch_size(), (32 + 48 * 16 + 48) * 4);
    }

    #[test]
    fn native_pipeline_executes_in_both_precisions() {
        for precision in [SamplePrecision::Float, SamplePrecision::Half] {
            let config = small_config(precision);
            let pipeline = PipelineHandle::new(&NativeEngine, &config).expect("pipeline");
            let mut buffers =
                WorkerBuffers::allocate(&config, pipeline.scratch_size()).expect("buffers");
            pipeline.execute(&mut buffers).expect("execute");
            pipeline.execute(&mut buffers).expect("execute twice");
        }
    }

    #[test]
    fn undersized_scratch_fails_invocation() {
        let config = small_config(SamplePrecision::Float);
        let pipeline = PipelineHandle::new(&NativeEngine, &config).expect("pipeline");
        let mut buffers = WorkerBuffers::allocate(&config, 16).expect("buffers");
        let err = pipeline.execute(&mut buffers).expect_err("scratch too small");
        assert!(err.to_string().contains("widen stage failed"));
    }
}
