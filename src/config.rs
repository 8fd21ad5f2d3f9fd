use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Which loader turns submitted identifiers into programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    /// Identifiers are program file paths.
    File,
    /// Identifiers are generator requests (`<n>`, `IO<n>`, `CPU<n>`).
    Random,
}

/// Simulation settings, read from a TOML file and overridden from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Wall-clock cost of running one instruction.
    pub quantum_ms: u64,
    /// Pause between dispatcher ticks.
    pub tick_ms: u64,
    /// Admission ceiling.
    pub max_load: usize,
    pub loader: LoaderKind,
    /// Seed for the random loader. Clock-seeded when absent.
    pub seed: Option<u64>,
    /// Base directory for relative program paths.
    pub program_dir: Option<PathBuf>,
    /// Default log filter, e.g. `info` or `debug`.
    pub log_level: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            quantum_ms: 100,
            tick_ms: 10,
            max_load: 5,
            loader: LoaderKind::File,
            seed: None,
            program_dir: None,
            log_level: None,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: &Path) -> Result<SimConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        SimConfig::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<SimConfig, ConfigError> {
        let config: SimConfig = toml::from_str(text).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_load == 0 {
            return Err(ConfigError::Invalid("max_load must be at least 1"));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be at least 1"));
        }
        Ok(())
    }

    pub fn quantum(&self) -> Duration {
        Duration::from_millis(self.quantum_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Toml(toml::de::Error),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config '{}': {source}", path.display())
            }
            Self::Toml(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Toml(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
