//! Command-line configuration for the simulator.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Usage text printed for `--help`.
pub const USAGE: &str = "\
Usage: bookrun-sim [OPTIONS]

Options:
  --tuning <PATH>      Zone tuning TOML (defaults when missing)
  --script <PATH>      Player script JSON (built-in walk when omitted)
  --duration-ms <MS>   Simulated time to run [default: 60000]
  --step-ms <MS>       Fixed simulation step [default: 16.667]
  --seed <N>           RNG seed [default: 1]
  --viewport <WIDTH>   Viewport width in world units [default: 800]
  --ground <Y>         Ground level [default: 400]
  --log-json           Emit logs as JSON
  -h, --help           Print this help";

/// Simulator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Zone tuning file
    pub tuning_path: Option<PathBuf>,
    /// Player script file
    pub script_path: Option<PathBuf>,
    /// Simulated time to run
    pub duration_ms: f32,
    /// Fixed simulation step
    pub step_ms: f32,
    /// Seed for the zone and frame-time jitter
    pub seed: u64,
    /// Viewport width in world units
    pub viewport_width: f32,
    /// Ground level shared by the player and NPCs
    pub ground_y: f32,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Print usage and exit
    pub help: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tuning_path: None,
            script_path: None,
            duration_ms: 60_000.0,
            step_ms: 1000.0 / 60.0,
            seed: 1,
            viewport_width: 800.0,
            ground_y: 400.0,
            log_json: false,
            help: false,
        }
    }
}

impl SimConfig {
    /// Parses arguments, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--tuning" => config.tuning_path = Some(value(&mut args, &arg)?.into()),
                "--script" => config.script_path = Some(value(&mut args, &arg)?.into()),
                "--duration-ms" => config.duration_ms = parse(&value(&mut args, &arg)?, &arg)?,
                "--step-ms" => config.step_ms = parse(&value(&mut args, &arg)?, &arg)?,
                "--seed" => config.seed = parse(&value(&mut args, &arg)?, &arg)?,
                "--viewport" => config.viewport_width = parse(&value(&mut args, &arg)?, &arg)?,
                "--ground" => config.ground_y = parse(&value(&mut args, &arg)?, &arg)?,
                "--log-json" => config.log_json = true,
                "-h" | "--help" => config.help = true,
                other => bail!("unknown argument `{other}`\n\n{USAGE}"),
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.duration_ms.is_nan() || self.duration_ms <= 0.0 {
            bail!("--duration-ms must be positive, got {}", self.duration_ms);
        }
        if self.step_ms.is_nan() || self.step_ms < 1.0 {
            bail!("--step-ms must be at least 1, got {}", self.step_ms);
        }
        if self.viewport_width.is_nan() || self.viewport_width <= 0.0 {
            bail!("--viewport must be positive, got {}", self.viewport_width);
        }
        Ok(())
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{flag} expects a value"))
}

fn parse<T>(raw: &str, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .with_context(|| format!("invalid value `{raw}` for {flag}"))
}
