use anyhow::{anyhow, bail, Context, Result};
use henon_core::compute::{ComputeSettings, Mode};
use henon_core::plan::DEFAULT_REMAINDER_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run configuration as read from a JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub t0: f64,
    pub t_end: f64,
    pub h: f64,
    pub energy: f64,
    pub stride: usize,
    pub threads: usize,
    pub remainder_tolerance: f64,
    pub output_dir: PathBuf,
    pub mode: Mode,
    /// Skip the CSV sink and only log the summary.
    pub no_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        let settings = ComputeSettings::default();
        Self {
            t0: settings.t0,
            t_end: settings.t_end,
            h: settings.h,
            energy: settings.energy,
            stride: settings.stride,
            threads: settings.threads,
            remainder_tolerance: DEFAULT_REMAINDER_TOLERANCE,
            output_dir: PathBuf::from("output"),
            mode: Mode::Both,
            no_output: false,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse configuration JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn settings(&self) -> ComputeSettings {
        ComputeSettings {
            t0: self.t0,
            t_end: self.t_end,
            h: self.h,
            energy: self.energy,
            stride: self.stride,
            threads: self.threads,
            remainder_tolerance: self.remainder_tolerance,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Config),
    Help,
}

/// Parses `args` (without the program name). A `--config` file is loaded
/// first; the remaining flags override its values regardless of order.
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut config_path: Option<PathBuf> = None;
    let mut overrides: Vec<(String, String)> = Vec::new();
    let mut no_output = false;

    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--no-output" => no_output = true,
            "--config" => config_path = Some(PathBuf::from(value_for(&flag, args.next())?)),
            "--mode" | "--h" | "--t-end" | "--t0" | "--energy" | "--stride" | "--threads"
            | "--output" => {
                let value = value_for(&flag, args.next())?;
                overrides.push((flag, value));
            }
            other => bail!("Unknown argument \"{other}\" (see --help)."),
        }
    }

    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    for (flag, value) in &overrides {
        apply_override(&mut config, flag, value)?;
    }
    if no_output {
        config.no_output = true;
    }
    Ok(Command::Run(config))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| anyhow!("Missing value for {flag}."))
}

fn apply_override(config: &mut Config, flag: &str, value: &str) -> Result<()> {
    match flag {
        "--mode" => config.mode = value.parse()?,
        "--h" => config.h = parse_number(flag, value)?,
        "--t-end" => config.t_end = parse_number(flag, value)?,
        "--t0" => config.t0 = parse_number(flag, value)?,
        "--energy" => config.energy = parse_number(flag, value)?,
        "--stride" => config.stride = parse_number(flag, value)?,
        "--threads" => config.threads = parse_number(flag, value)?,
        "--output" => config.output_dir = PathBuf::from(value),
        _ => bail!("Unknown argument \"{flag}\"."),
    }
    Ok(())
}

fn parse_number<T>(flag: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid value \"{value}\" for {flag}"))
}

pub const USAGE: &str = "\
Integrate the Henon-Heiles system with RK4, RK3, Kahan's implicit method and
Stormer-Verlet, then write energy tables and Poincare sections.

Usage: henon [OPTIONS]

Options:
  --config <path>     JSON configuration file (fields as below, all optional)
  --mode <mode>       both | hamiltonians | poincare [default: both]
  --h <step>          step size [default: 0.1]
  --t-end <time>      end time [default: 3e6]
  --t0 <time>         start time [default: 0]
  --energy <H0>       initial energy [default: 1/12]
  --stride <k>        keep every k-th sample [default: 1]
  --threads <n>       worker threads, 0 for all cores [default: 0]
  --output <dir>      directory for CSV files [default: output]
  --no-output         compute and log a summary without writing files
  -h, --help          print this help

Set RUST_LOG=debug for per-method timings.
";
