use anyhow::{Context, Result, anyhow};
use common::{BenchmarkConfig, DEFAULT_WORK_ITEMS_PER_THREAD, SamplePrecision};
use pixel_engine::NativeEngine;
use scaling_bench::{ScalingDriver, SweepReport, banner, format_measurement};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

const ENV_TIMES: &str = "SCALING_BENCH_TIMES";
const ENV_THREADS: &str = "SCALING_BENCH_THREADS";
const BENCH_TARGET: &str = "scaling_bench";
const BENCH_LOG_DIRECTIVE: &str = "scaling_bench=info";
const EXIT_RUNTIME_ERROR: u8 = 1;
const EXIT_USAGE_ERROR: u8 = 2;

const USAGE: &str = "\
usage: scaling-bench [--half | --float] [--times N] [--threads N] [--json] [--out PATH]

  --half         use half precision intermediates
  --float        use single precision intermediates (default)
  --times N      number of benchmark cycles per thread (default 100)
  --threads N    number of threads (default: sweep 1..=hardware concurrency)
  --json         print the sweep as JSON instead of the text report
  --out PATH     also write the JSON report to PATH
  -h, --help     print this help
";

#[derive(Clone, Debug, PartialEq)]
struct CliOptions {
    config: BenchmarkConfig,
    json: bool,
    out: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
enum Command {
    Run(CliOptions),
    Help,
}

#[derive(Clone, Debug, Default)]
struct EnvOverrides {
    times: Option<String>,
    threads: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            times: env::var(ENV_TIMES).ok(),
            threads: env::var(ENV_THREADS).ok(),
        }
    }
}

fn main() -> ExitCode {
    init_tracing(env::var("RUST_LOG").ok().as_deref());
    let args = env::args().skip(1).collect::<Vec<_>>();

    let options = match parse_args(&args, &EnvOverrides::from_env()) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("argument error: {err:#}");
            eprint!("{USAGE}");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("runtime error: {err:#}");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn run(options: &CliOptions) -> Result<()> {
    let driver = ScalingDriver::from_factory(&NativeEngine, &options.config)?;
    if !options.json {
        println!("{}", banner(&options.config));
    }

    let measurements = driver.sweep(|measurement| {
        if !options.json {
            print!("{}", format_measurement(measurement));
        }
    })?;

    if !options.json && options.out.is_none() {
        return Ok(());
    }
    let report = SweepReport::new(&options.config, driver.range(), measurements);
    let encoded = serde_json::to_vec_pretty(&report).context("encode sweep report")?;
    if options.json {
        println!("{}", String::from_utf8_lossy(&encoded));
    }
    if let Some(path) = &options.out {
        fs::write(path, &encoded)
            .with_context(|| format!("write report file {}", path.display()))?;
    }
    Ok(())
}

fn parse_args(args: &[String], env: &EnvOverrides) -> Result<Command> {
    let mut config = BenchmarkConfig {
        work_items_per_thread: resolve_count(env.times.as_deref(), ENV_TIMES)?
            .unwrap_or(DEFAULT_WORK_ITEMS_PER_THREAD),
        thread_count_override: resolve_count(env.threads.as_deref(), ENV_THREADS)?,
        ..BenchmarkConfig::default()
    };
    let mut json = false;
    let mut out = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--half" => config.precision = SamplePrecision::Half,
            "--float" => config.precision = SamplePrecision::Float,
            "--json" => json = true,
            "--times" => {
                i += 1;
                let raw = args.get(i).context("--times requires a numeric value")?;
                config.work_items_per_thread = parse_count(raw, "--times")?;
            }
            "--threads" => {
                i += 1;
                let raw = args.get(i).context("--threads requires a numeric value")?;
                config.thread_count_override = Some(parse_count(raw, "--threads")?);
            }
            "--out" => {
                i += 1;
                let raw = args.get(i).context("--out requires a path")?;
                out = Some(PathBuf::from(raw));
            }
            unknown => return Err(anyhow!("unknown argument '{unknown}'")),
        }
        i += 1;
    }

    if config.thread_count_override == Some(0) {
        config.thread_count_override = None;
    }
    Ok(Command::Run(CliOptions { config, json, out }))
}

fn resolve_count(env_override: Option<&str>, name: &str) -> Result<Option<u32>> {
    match env_override.map(str::trim) {
        Some(value) if !value.is_empty() => parse_count(value, name).map(Some),
        _ => Ok(None),
    }
}

fn parse_count(raw: &str, name: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("invalid {name} value '{raw}'"))
}

fn init_tracing(rust_log: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// `RUST_LOG` directives (default `warn`), with measurement progress at info
/// unless they already configure this crate.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    let directives = rust_log
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("warn");
    let filter = EnvFilter::builder().parse_lossy(directives);
    if configures_bench_target(directives) {
        return filter;
    }
    match BENCH_LOG_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn configures_bench_target(directives: &str) -> bool {
    directives
        .split(',')
        .filter_map(|directive| directive.split(['=', '[']).next())
        .any(|target| target.trim() == BENCH_TARGET)
}

#[cfg(test)]
mod tests {
    use super::{Command, EnvOverrides, configures_bench_target, log_filter, parse_args};
    use common::SamplePrecision;
    use tracing_subscriber::filter::LevelFilter;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn run_options(values: &[&str], env: &EnvOverrides) -> super::CliOptions {
        match parse_args(&args(values), env).expect("parse args") {
            Command::Run(options) => options,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults_sweep_with_float_precision() {
        let options = run_options(&[], &EnvOverrides::default());
        assert_eq!(options.config.precision, SamplePrecision::Float);
        assert_eq!(options.config.work_items_per_thread, 100);
        assert_eq!(options.config.thread_count_override, None);
        assert!(!options.json);
        assert!(options.out.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let options = run_options(
            &["--half", "--times", "10", "--threads", "4", "--json"],
            &EnvOverrides::default(),
        );
        assert_eq!(options.config.precision, SamplePrecision::Half);
        assert_eq!(options.config.work_items_per_thread, 10);
        assert_eq!(options.config.thread_count_override, Some(4));
        assert!(options.json);
    }

    #[test]
    fn last_precision_flag_wins() {
        let options = run_options(&["--half", "--float"], &EnvOverrides::default());
        assert_eq!(options.config.precision, SamplePrecision::Float);
    }

    #[test]
    fn zero_threads_means_full_sweep() {
        let options = run_options(&["--threads", "0"], &EnvOverrides::default());
        assert_eq!(options.config.thread_count_override, None);
    }

    #[test]
    fn env_values_apply_below_flags() {
        let env = EnvOverrides {
            times: Some("7".to_owned()),
            threads: Some(" 3 ".to_owned()),
        };
        let options = run_options(&[], &env);
        assert_eq!(options.config.work_items_per_thread, 7);
        assert_eq!(options.config.thread_count_override, Some(3));

        let options = run_options(&["--times", "9"], &env);
        assert_eq!(options.config.work_items_per_thread, 9);
    }

    #[test]
    fn help_is_reported() {
        let command = parse_args(&args(&["--times", "5", "--help"]), &EnvOverrides::default())
            .expect("parse help");
        assert_eq!(command, Command::Help);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let env = EnvOverrides::default();
        assert!(parse_args(&args(&["--times"]), &env).is_err());
        assert!(parse_args(&args(&["--times", "-1"]), &env).is_err());
        assert!(parse_args(&args(&["--threads", "many"]), &env).is_err());
        assert!(parse_args(&args(&["--bogus"]), &env).is_err());

        let bad_env = EnvOverrides {
            times: Some("lots".to_owned()),
            threads: None,
        };
        assert!(parse_args(&args(&[]), &bad_env).is_err());
    }

    #[test]
    fn log_filter_defaults_to_warn_with_bench_progress() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn log_filter_keeps_explicit_bench_directive() {
        assert_eq!(
            log_filter(Some("error,scaling_bench=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("scaling_bench=off")).max_level_hint(),
            Some(LevelFilter::OFF)
        );
        assert_eq!(log_filter(Some("error")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn bench_target_detection_ignores_other_crates() {
        assert!(configures_bench_target("warn, scaling_bench=trace"));
        assert!(configures_bench_target("scaling_bench[measure]=debug"));
        assert!(configures_bench_target("scaling_bench"));
        assert!(!configures_bench_target("scaling_bench_extra=debug"));
        assert!(!configures_bench_target("debug"));
    }
}
