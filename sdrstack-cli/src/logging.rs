//! Structured logging for CLI-level events (scan results, channel
//! discovery, transport-stream summaries). Distinct from the core crate's
//! internal [`sdrstack_core::logging::SignalLogger`], which records
//! subsystem-filtered diagnostics rather than user-facing output.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    StationFound(StationEvent),
    ChannelSummary(ChannelSummaryEvent),
    TsSummary(TsSummaryEvent),
    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationEvent {
    pub timestamp: DateTime<Utc>,
    pub frequency_hz: f64,
    pub magnitude_db: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummaryEvent {
    pub timestamp: DateTime<Utc>,
    pub frequency_hz: i64,
    pub pinned: bool,
    pub last_magnitude_db: f32,
    pub age_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsSummaryEvent {
    pub timestamp: DateTime<Utc>,
    pub packets_parsed: u64,
    pub sync_errors: u64,
    pub continuity_errors: u64,
    pub table_updates: u64,
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => serde_json::to_string(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{output}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::StationFound(s) => format!(
                "ts=\"{}\" type=station frequency_hz={} magnitude_db={:.2}",
                ts, s.frequency_hz, s.magnitude_db
            ),
            LogEvent::ChannelSummary(c) => format!(
                "ts=\"{}\" type=channel frequency_hz={} pinned={} magnitude_db={:.2} age_secs={:.1}",
                ts, c.frequency_hz, c.pinned, c.last_magnitude_db, c.age_secs
            ),
            LogEvent::TsSummary(t) => format!(
                "ts=\"{}\" type=ts_summary packets={} sync_errors={} continuity_errors={} table_updates={}",
                ts, t.packets_parsed, t.sync_errors, t.continuity_errors, t.table_updates
            ),
            LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
            LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{ts}\" level=error msg=\"{message}\" details=\"{d}\""),
                None => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::StationFound(s) => {
                format!("[{}] STATION: {:.3} MHz @ {:.1} dB", ts, s.frequency_hz / 1e6, s.magnitude_db)
            }
            LogEvent::ChannelSummary(c) => format!(
                "[{}] CHANNEL {:.3} MHz: {} | {:.1} dB | age {:.1}s",
                ts,
                c.frequency_hz as f64 / 1e6,
                if c.pinned { "pinned" } else { "auto" },
                c.last_magnitude_db,
                c.age_secs
            ),
            LogEvent::TsSummary(t) => format!(
                "[{}] TS SUMMARY: {} packets | sync_err={} continuity_err={} tables={}",
                ts, t.packets_parsed, t.sync_errors, t.continuity_errors, t.table_updates
            ),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
            LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{ts}] ERROR: {message} | {d}"),
                None => format!("[{ts}] ERROR: {message}"),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
