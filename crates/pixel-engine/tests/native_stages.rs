use common::{
    ColorDescription, ColorMatrix, ColorPrimaries, PixelType, PlaneGeometry,
    TransferCharacteristics,
};
use pixel_engine::{
    ColorspaceParams, DepthArgs, DitherType, NativeEngine, PlaneMut, PlaneRef, ResizeFilter,
    ResizeParams, SampleRange, StageFactory,
};

const LIMITED_8BIT: SampleRange = SampleRange {
    depth: 8,
    full_range: false,
};

const FULL_8BIT: SampleRange = SampleRange {
    depth: 8,
    full_range: true,
};

fn float_plane(geometry: PlaneGeometry) -> Vec<f32> {
    vec![0.0; geometry.sample_count()]
}

#[test]
fn factory_builds_every_stage_through_shared_reference() {
    let engine = NativeEngine;
    let factory: &dyn StageFactory = &engine;

    let depth = factory
        .create_depth(DitherType::Ordered)
        .expect("create depth");
    assert_eq!(depth.scratch_size(1280), 1280 * 4);

    let resize = factory
        .create_resize(&ResizeParams::new(
            ResizeFilter::Lanczos { taps: 4 },
            PlaneGeometry::new(1280, 720),
            PlaneGeometry::new(1920, 1080),
        ))
        .expect("create resize");
    assert!(resize.scratch_size(PixelType::Float) >= 1920 * 720 * 4);

    let colorspace = factory
        .create_colorspace(&ColorspaceParams {
            input: ColorDescription::new(
                ColorMatrix::Bt709,
                TransferCharacteristics::Bt709,
                ColorPrimaries::Bt709,
            ),
            output: ColorDescription::new(
                ColorMatrix::Rgb,
                TransferCharacteristics::Bt709,
                ColorPrimaries::Bt709,
            ),
        })
        .expect("create colorspace");
    assert_eq!(colorspace.scratch_size(1280), 3 * 1280 * 4);
}

#[test]
fn mid_grey_word_plane_survives_widen_resize_narrow() {
    let engine = NativeEngine;
    let src_geometry = PlaneGeometry::new(8, 4);
    let dst_geometry = PlaneGeometry::new(12, 6);

    let widen = engine.create_depth(DitherType::None).expect("widen");
    let narrow = engine.create_depth(DitherType::None).expect("narrow");
    let resize = engine
        .create_resize(&ResizeParams::new(
            ResizeFilter::Lanczos { taps: 4 },
            src_geometry,
            dst_geometry,
        ))
        .expect("resize");

    let scratch_floats = resize
        .scratch_size(PixelType::Float)
        .max(widen.scratch_size(dst_geometry.width))
        / 4;
    let mut scratch = vec![0.0_f32; scratch_floats];

    // 8-bit limited range code 126 in 16-bit words.
    let source = vec![126_u16; src_geometry.sample_count()];
    let mut widened = float_plane(src_geometry);
    let mut resized = float_plane(dst_geometry);
    let mut output = vec![0_u8; dst_geometry.sample_count()];

    let src = PlaneRef::new(
        bytemuck::cast_slice(&source[..]),
        8 * 2,
        src_geometry,
        PixelType::Word,
    )
    .expect("source plane");
    let mut widened_plane = PlaneMut::new(
        bytemuck::cast_slice_mut(&mut widened[..]),
        8 * 4,
        src_geometry,
        PixelType::Float,
    )
    .expect("widened plane");
    widen
        .process(
            &src,
            &mut widened_plane,
            bytemuck::cast_slice_mut(&mut scratch[..]),
            &DepthArgs {
                input: LIMITED_8BIT,
                output: FULL_8BIT,
                chroma: false,
            },
        )
        .expect("widen plane");

    let mut resized_plane = PlaneMut::new(
        bytemuck::cast_slice_mut(&mut resized[..]),
        12 * 4,
        dst_geometry,
        PixelType::Float,
    )
    .expect("resized plane");
    resize
        .process(
            &widened_plane.as_plane_ref(),
            &mut resized_plane,
            bytemuck::cast_slice_mut(&mut scratch[..]),
        )
        .expect("resize plane");

    let mut output_plane =
        PlaneMut::new(&mut output, 12, dst_geometry, PixelType::Byte).expect("output plane");
    narrow
        .process(
            &resized_plane.as_plane_ref(),
            &mut output_plane,
            bytemuck::cast_slice_mut(&mut scratch[..]),
            &DepthArgs {
                input: FULL_8BIT,
                output: FULL_8BIT,
                chroma: false,
            },
        )
        .expect("narrow plane");

    // (126 - 16) / 219 * 255 = 128.08
    assert!(output.iter().all(|&code| code == 128), "{output:?}");
}

#[test]
fn undersized_scratch_is_an_invocation_error() {
    let engine = NativeEngine;
    let geometry = PlaneGeometry::new(16, 1);
    let depth = engine.create_depth(DitherType::None).expect("depth");

    let source = vec![0.0_f32; 16];
    let mut target = vec![0.0_f32; 16];
    let mut scratch = vec![0.0_f32; 4];

    let src = PlaneRef::new(
        bytemuck::cast_slice(&source[..]),
        64,
        geometry,
        PixelType::Float,
    )
    .expect("source plane");
    let mut dst = PlaneMut::new(
        bytemuck::cast_slice_mut(&mut target[..]),
        64,
        geometry,
        PixelType::Float,
    )
    .expect("target plane");

    let err = depth
        .process(
            &src,
            &mut dst,
            bytemuck::cast_slice_mut(&mut scratch[..]),
            &DepthArgs {
                input: FULL_8BIT,
                output: FULL_8BIT,
                chroma: false,
            },
        )
        .expect_err("scratch too small");
    assert!(err.to_string().contains("scratch buffer too small"));
}
