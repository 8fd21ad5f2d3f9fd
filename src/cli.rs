//! Command-line parsing for `scheduler-sim`.
//!
//! Hand-rolled, the flag set is small and flat.
//!
//! ```text
//! scheduler-sim [--config <file>] [--quantum <ms>] [--tick <ms>]
//!               [--max-load <n>] [--random] [--seed <n>]
//!               [--program-dir <dir>] [--log-level <filter>]
//! ```

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{LoaderKind, SimConfig};

pub const USAGE: &str = "\
usage: scheduler-sim [options]

options:
  --config <file>        read settings from a TOML file
  --quantum <ms>         time charged per instruction
  --tick <ms>            dispatcher tick period
  --max-load <n>         admission ceiling
  --random               synthesize programs instead of reading files
  --seed <n>             seed for --random
  --program-dir <dir>    base directory for program files
  --log-level <filter>   log filter (error, warn, info, debug, trace)
  -h, --help             show this help";

/// Parsed flags. Unset fields leave the config untouched.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub quantum_ms: Option<u64>,
    pub tick_ms: Option<u64>,
    pub max_load: Option<usize>,
    pub random: bool,
    pub seed: Option<u64>,
    pub program_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub help: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    UnknownFlag(String),
    MissingValue(&'static str),
    InvalidValue { flag: &'static str, value: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag(flag) => write!(f, "unknown argument '{flag}'"),
            Self::MissingValue(flag) => write!(f, "{flag} requires a value"),
            Self::InvalidValue { flag, value } => {
                write!(f, "invalid value '{value}' for {flag}")
            }
        }
    }
}

impl Error for CliError {}

impl CliArgs {
    /// Parses arguments, not including the program name.
    pub fn parse<I>(args: I) -> Result<CliArgs, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--random" => parsed.random = true,
                "--config" => parsed.config = Some(value(&mut args, "--config")?.into()),
                "--quantum" => parsed.quantum_ms = Some(number(&mut args, "--quantum")?),
                "--tick" => parsed.tick_ms = Some(number(&mut args, "--tick")?),
                "--max-load" => parsed.max_load = Some(number(&mut args, "--max-load")?),
                "--seed" => parsed.seed = Some(number(&mut args, "--seed")?),
                "--program-dir" => {
                    parsed.program_dir = Some(value(&mut args, "--program-dir")?.into())
                }
                "--log-level" => parsed.log_level = Some(value(&mut args, "--log-level")?),
                _ => return Err(CliError::UnknownFlag(arg)),
            }
        }

        Ok(parsed)
    }

    /// Overlays the flags that were given onto `config`.
    pub fn apply(&self, config: &mut SimConfig) {
        if let Some(quantum_ms) = self.quantum_ms {
            config.quantum_ms = quantum_ms;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(max_load) = self.max_load {
            config.max_load = max_load;
        }
        if self.random {
            config.loader = LoaderKind::Random;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.program_dir.is_some() {
            config.program_dir = self.program_dir.clone();
        }
        if self.log_level.is_some() {
            config.log_level = self.log_level.clone();
        }
    }
}

fn value<I>(args: &mut I, flag: &'static str) -> Result<String, CliError>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or(CliError::MissingValue(flag))
}

fn number<I, T>(args: &mut I, flag: &'static str) -> Result<T, CliError>
where
    I: Iterator<Item = String>,
    T: FromStr,
{
    let raw = value(args, flag)?;
    raw.parse()
        .map_err(|_| CliError::InvalidValue { flag, value: raw })
}
