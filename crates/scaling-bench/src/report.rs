use crate::driver::{Measurement, ThreadRange};
use common::{BenchmarkConfig, ColorMatrix, PixelType};
use serde::{Deserialize, Serialize};

/// One-line summary of the fixed workload, e.g. `1280x720/420/W => 1920x1080/RGB/B`.
pub fn banner(config: &BenchmarkConfig) -> String {
    let family = match config.destination_color.matrix {
        ColorMatrix::Rgb => "RGB",
        _ => "YUV",
    };
    format!(
        "{}/{}/{} => {}/{}/{}",
        config.source,
        config.subsampling_label(),
        PixelType::Word.short_name(),
        config.destination,
        family,
        PixelType::Byte.short_name(),
    )
}

pub fn format_measurement(measurement: &Measurement) -> String {
    format!(
        "\nthreads:    {}\niterations: {}\nfps:        {:.3}\n",
        measurement.thread_count, measurement.total_iterations, measurement.throughput
    )
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub workload: String,
    pub config: BenchmarkConfig,
    pub threads: ThreadRange,
    pub measurements: Vec<Measurement>,
}

impl SweepReport {
    pub fn new(config: &BenchmarkConfig, threads: ThreadRange, measurements: Vec<Measurement>) -> Self {
        Self {
            workload: banner(config),
            config: config.clone(),
            threads,
            measurements,
        }
    }
}
