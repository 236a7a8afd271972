mod config;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};

use config::CliConfig;
use logging::{ChannelSummaryEvent, LogEvent, StationEvent, StructuredLogger, TsSummaryEvent};
use sdrstack_core::bookmarks::{self, Bookmark};
use sdrstack_core::channelizer::Channelizer;
use sdrstack_core::context::DspContext;
use sdrstack_core::logging::SignalLogger;
use sdrstack_core::pipeline::FmPipeline;
use sdrstack_core::recording::IqRecording;
use sdrstack_core::scanner;
use sdrstack_core::ts::TransportStreamParser;

#[derive(Parser, Debug)]
#[command(author, version, about = "sdrstack wideband SDR channelizer and transport-stream demultiplexer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan an I/Q recording for candidate station peaks.
    Scan {
        /// Path to an I/Q recording (JSON or length-prefixed binary form).
        recording: PathBuf,
    },
    /// Channelize a single station out of a wideband I/Q recording.
    Channelize {
        recording: PathBuf,
        /// Absolute channel frequency in Hz.
        #[arg(long)]
        channel_hz: i64,
    },
    /// Run the multi-station FM pipeline once over a wideband recording.
    Pipeline { recording: PathBuf },
    /// Parse a raw MPEG-2 transport stream capture and print PSI tables.
    TsDump { capture: PathBuf },
    /// Export bookmarks (JSON array) to CSV.
    BookmarksExport {
        bookmarks: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_recording(path: &PathBuf) -> Result<IqRecording> {
    let bytes = std::fs::read(path).wrap_err_with(|| format!("Failed to read recording: {}", path.display()))?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let text = String::from_utf8(bytes).wrap_err("Recording is not valid UTF-8 JSON")?;
        IqRecording::from_json(&text).wrap_err("Failed to parse JSON recording")
    } else {
        IqRecording::from_binary(&bytes).wrap_err("Failed to parse binary recording")
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cli_config = match &args.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };

    let mut logger = StructuredLogger::new(cli_config.terminal.logging.clone())?;

    match args.command {
        Command::Scan { recording } => run_scan(&recording, &cli_config, &mut logger)?,
        Command::Channelize { recording, channel_hz } => {
            run_channelize(&recording, channel_hz, &cli_config, &mut logger)?
        }
        Command::Pipeline { recording } => run_pipeline(&recording, &cli_config, &mut logger)?,
        Command::TsDump { capture } => run_ts_dump(&capture, &mut logger)?,
        Command::BookmarksExport { bookmarks, output } => run_bookmarks_export(&bookmarks, output)?,
    }

    Ok(())
}

fn run_scan(recording_path: &PathBuf, cli_config: &CliConfig, logger: &mut StructuredLogger) -> Result<()> {
    let recording = load_recording(recording_path)?;
    let ctx = DspContext::with_toggles(cli_config.pipeline.accelerator_toggles());
    let mut signal_logger = SignalLogger::new(cli_config.terminal.logging.to_core_log_config());

    let scan_config = cli_config.pipeline.scan.clone().into();
    let peaks = scanner::scan(
        &recording.i,
        &recording.q,
        recording.metadata.sample_rate_hz,
        recording.metadata.center_frequency_hz,
        &scan_config,
        &ctx,
        &mut signal_logger,
    )
    .wrap_err("Scan failed")?;

    logger.log(LogEvent::Info {
        message: format!("Found {} candidate station(s)", peaks.len()),
    })?;
    for peak in peaks {
        logger.log(LogEvent::StationFound(StationEvent {
            timestamp: chrono::Utc::now(),
            frequency_hz: peak.frequency_hz,
            magnitude_db: peak.magnitude_db,
        }))?;
    }

    Ok(())
}

fn run_channelize(
    recording_path: &PathBuf,
    channel_hz: i64,
    cli_config: &CliConfig,
    logger: &mut StructuredLogger,
) -> Result<()> {
    let recording = load_recording(recording_path)?;
    let mut signal_logger = SignalLogger::new(cli_config.terminal.logging.to_core_log_config());

    let channelizer = Channelizer::new(
        recording.metadata.sample_rate_hz,
        cli_config.pipeline.channel_bandwidth_hz,
        cli_config.pipeline.taps_per_phase,
        cli_config.pipeline.use_pfb_channelizer,
        &mut signal_logger,
    )
    .wrap_err("Failed to construct channelizer")?;

    let channelized = channelizer
        .channelize_one(
            &recording.i,
            &recording.q,
            recording.metadata.sample_rate_hz,
            recording.metadata.center_frequency_hz as i64,
            channel_hz,
        )
        .wrap_err("Channelization failed")?;

    match channelized {
        Some((i, q)) => {
            logger.log(LogEvent::Info {
                message: format!(
                    "Extracted {} samples via {:?} at {:.3} MHz",
                    i.len(),
                    channelizer.algorithm(),
                    channel_hz as f64 / 1e6
                ),
            })?;
            let audio = sdrstack_core::dsp::fm::fm_discriminate(&i, &q);
            logger.log(LogEvent::Info {
                message: format!("FM-discriminated {} audio samples", audio.len()),
            })?;
        }
        None => {
            logger.log(LogEvent::Warn {
                message: format!("Requested channel {channel_hz} Hz is outside the capture bandwidth"),
            })?;
        }
    }

    Ok(())
}

fn run_pipeline(recording_path: &PathBuf, cli_config: &CliConfig, logger: &mut StructuredLogger) -> Result<()> {
    let recording = load_recording(recording_path)?;

    let mut pipeline_config = cli_config.pipeline.pipeline_config();
    pipeline_config.sample_rate = recording.metadata.sample_rate_hz;
    pipeline_config.center_frequency_hz = recording.metadata.center_frequency_hz as i64;

    let mut pipeline = FmPipeline::new(pipeline_config).wrap_err("Failed to construct pipeline")?;
    let outputs = pipeline
        .process_wideband_samples(&recording.i, &recording.q)
        .wrap_err("Pipeline processing failed")?;

    logger.log(LogEvent::Info {
        message: format!("Produced audio for {} channel(s)", outputs.len()),
    })?;

    for summary in pipeline.get_channels() {
        logger.log(LogEvent::ChannelSummary(ChannelSummaryEvent {
            timestamp: chrono::Utc::now(),
            frequency_hz: summary.frequency_hz,
            pinned: summary.pinned,
            last_magnitude_db: summary.last_magnitude_db,
            age_secs: summary.age.as_secs_f64(),
        }))?;
    }

    Ok(())
}

fn run_ts_dump(capture_path: &PathBuf, logger: &mut StructuredLogger) -> Result<()> {
    let bytes =
        std::fs::read(capture_path).wrap_err_with(|| format!("Failed to read capture: {}", capture_path.display()))?;

    let mut parser = TransportStreamParser::new();
    parser.parse_stream(&bytes);

    let counters = parser.counters();
    logger.log(LogEvent::TsSummary(TsSummaryEvent {
        timestamp: chrono::Utc::now(),
        packets_parsed: (bytes.len() / sdrstack_core::ts::packet::PACKET_SIZE) as u64,
        sync_errors: counters.sync_errors,
        continuity_errors: counters.continuity_errors,
        table_updates: counters.table_updates,
    }))?;

    if let Some(pat) = parser.get_pat() {
        for (&program, &pmt_pid) in &pat.program_map {
            logger.log(LogEvent::Info {
                message: format!("PAT: program {program} -> PMT PID {pmt_pid:#06x}"),
            })?;
            if let Some(pmt) = parser.get_pmt(program) {
                for stream in &pmt.elementary_streams {
                    logger.log(LogEvent::Info {
                        message: format!(
                            "  stream PID {:#06x}: {:?}",
                            stream.elementary_pid, stream.stream_type
                        ),
                    })?;
                }
            }
        }
    }

    if let Some(vct) = parser.get_vct() {
        for channel in &vct.channels {
            logger.log(LogEvent::Info {
                message: format!(
                    "VCT: {} ({}.{})",
                    channel.short_name, channel.major_number, channel.minor_number
                ),
            })?;
        }
    }

    Ok(())
}

fn run_bookmarks_export(bookmarks_path: &PathBuf, output: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(bookmarks_path)
        .wrap_err_with(|| format!("Failed to read bookmarks: {}", bookmarks_path.display()))?;
    let entries: Vec<Bookmark> = serde_json::from_str(&text).wrap_err("Failed to parse bookmarks JSON")?;

    let csv = bookmarks::export_csv(&entries);

    match output {
        Some(path) => std::fs::write(&path, csv).wrap_err_with(|| format!("Failed to write {}", path.display()))?,
        None => print!("{csv}"),
    }

    Ok(())
}
