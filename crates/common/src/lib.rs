use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DEFAULT_WORK_ITEMS_PER_THREAD: u32 = 100;

/// In-memory sample representation of a plane.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelType {
    Byte,
    Word,
    Half,
    Float,
}

impl PixelType {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word | Self::Half => 2,
            Self::Float => 4,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::Word)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::Byte => "B",
            Self::Word => "W",
            Self::Half => "H",
            Self::Float => "F",
        }
    }
}

/// Floating point format used for every intermediate plane of the pipeline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePrecision {
    #[default]
    Float,
    Half,
}

impl SamplePrecision {
    pub fn pixel_type(self) -> PixelType {
        match self {
            Self::Float => PixelType::Float,
            Self::Half => PixelType::Half,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Half => "half",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PlaneGeometry {
    pub width: u32,
    pub height: u32,
}

impl PlaneGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Display for PlaneGeometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMatrix {
    Rgb,
    Bt601,
    Bt709,
    Bt2020Ncl,
}

impl ColorMatrix {
    /// Luma weights `(kr, kb)`; `None` for RGB.
    pub fn luma_coefficients(self) -> Option<(f32, f32)> {
        match self {
            Self::Rgb => None,
            Self::Bt601 => Some((0.299, 0.114)),
            Self::Bt709 => Some((0.2126, 0.0722)),
            Self::Bt2020Ncl => Some((0.2627, 0.0593)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferCharacteristics {
    Bt709,
    Srgb,
    Linear,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPrimaries {
    Bt709,
    Bt2020,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ColorDescription {
    pub matrix: ColorMatrix,
    pub transfer: TransferCharacteristics,
    pub primaries: ColorPrimaries,
}

impl ColorDescription {
    pub const fn new(
        matrix: ColorMatrix,
        transfer: TransferCharacteristics,
        primaries: ColorPrimaries,
    ) -> Self {
        Self {
            matrix,
            transfer,
            primaries,
        }
    }
}

/// Immutable description of the benchmarked workload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub source: PlaneGeometry,
    pub chroma: PlaneGeometry,
    pub destination: PlaneGeometry,
    pub precision: SamplePrecision,
    pub source_color: ColorDescription,
    pub destination_color: ColorDescription,
    pub work_items_per_thread: u32,
    #[serde(default)]
    pub thread_count_override: Option<u32>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            source: PlaneGeometry::new(1280, 720),
            chroma: PlaneGeometry::new(640, 360),
            destination: PlaneGeometry::new(1920, 1080),
            precision: SamplePrecision::Float,
            source_color: ColorDescription::new(
                ColorMatrix::Bt709,
                TransferCharacteristics::Bt709,
                ColorPrimaries::Bt709,
            ),
            destination_color: ColorDescription::new(
                ColorMatrix::Rgb,
                TransferCharacteristics::Bt709,
                ColorPrimaries::Bt709,
            ),
            work_items_per_thread: DEFAULT_WORK_ITEMS_PER_THREAD,
            thread_count_override: None,
        }
    }
}

impl BenchmarkConfig {
    /// Pixel type of every intermediate plane.
    pub fn intermediate_type(&self) -> PixelType {
        self.precision.pixel_type()
    }

    /// Dispatcher seed for one measurement at `threads` workers.
    pub fn work_items_for(&self, threads: u32) -> i64 {
        i64::from(self.work_items_per_thread) * i64::from(threads)
    }

    /// Chroma subsampling label such as `420` or `444`.
    pub fn subsampling_label(&self) -> &'static str {
        let horizontal = self.chroma.width < self.source.width;
        let vertical = self.chroma.height < self.source.height;
        match (horizontal, vertical) {
            (true, true) => "420",
            (true, false) => "422",
            (false, true) => "440",
            (false, false) => "444",
        }
    }
}
