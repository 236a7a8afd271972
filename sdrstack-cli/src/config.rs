//! CLI-specific configuration structures for TOML-based configuration.

use color_eyre::eyre::{Context, Result};
use sdrstack_core::SdrStackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete CLI configuration bundle: the pipeline configuration plus
/// terminal-facing concerns (logging target/format).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub pipeline: SdrStackConfig,

    #[serde(default)]
    pub terminal: TerminalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_target")]
    pub target: LogTarget,

    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stderr
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LoggingConfig {
    /// Convert CLI logging config into the core crate's subsystem-filtered
    /// log configuration.
    pub fn to_core_log_config(&self) -> sdrstack_core::logging::LogConfig {
        use sdrstack_core::logging::{LogConfig as CoreLogConfig, LogLevel as CoreLogLevel};

        let level = match self.level {
            LogLevel::Debug => CoreLogLevel::Debug,
            LogLevel::Info => CoreLogLevel::Info,
            LogLevel::Warn => CoreLogLevel::Warn,
            LogLevel::Error => CoreLogLevel::Error,
        };

        CoreLogConfig {
            level,
            ..Default::default()
        }
    }
}

impl CliConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config: CliConfig =
            toml::from_str(&content).wrap_err("Failed to parse TOML configuration")?;

        config
            .pipeline
            .validate()
            .wrap_err("Invalid pipeline configuration")?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_pretty_stderr_logging() {
        let config = CliConfig::default();
        assert_eq!(config.terminal.logging.target, LogTarget::Stderr);
        assert_eq!(config.terminal.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parses_minimal_toml() {
        let toml_str = "[pipeline]\nsample_rate = 2000000.0\ncenter_frequency_hz = 100000000\nchannel_bandwidth_hz = 200000.0\nenable_rds = true\nscan_interval_ms = 1000\nstale_channel_timeout_ms = 5000\nuse_pfb_channelizer = true\nuse_worker_fft = false\ntaps_per_phase = 8\n[pipeline.scan]\nfft_size = 8192\nthreshold_db = -70.0\nauto_threshold = true\nthreshold_db_offset = 18.0\nmax_stations = 60\nmin_separation_hz = 100000.0\nmin_valley_depth_db = 6.0\n[pipeline.acceleration]\nenabled = true\nvalidate = false\n";
        let config: CliConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline.sample_rate, 2_000_000.0);
    }
}
