//! sdrstack error types with granular categories

use thiserror::Error;

/// Top-level error type for all sdrstack operations
#[derive(Debug, Error)]
pub enum SdrError {
    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),

    #[error("Channelizer error: {0}")]
    Channelizer(#[from] ChannelizerError),

    #[error("Transport stream error: {0}")]
    Ts(#[from] TsError),

    #[error("PES error: {0}")]
    Pes(#[from] PesError),

    #[error("Video decoder error: {0}")]
    Decoder(#[from] DecoderError),

    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// DSP processing errors
#[derive(Debug, Error)]
pub enum DspError {
    #[error("FFT size {size} is not a power of 2")]
    InvalidFftSize { size: usize },

    #[error("input length {actual} is shorter than requested FFT size {size}")]
    InsufficientSamples { size: usize, actual: usize },

    #[error("input contains NaN")]
    NonFiniteInput,

    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },

    #[error("decimation factor must be >= 1, got {factor}")]
    InvalidDecimationFactor { factor: usize },

    #[error("worker-pool FFT job was cancelled")]
    WorkerCancelled,
}

/// Channelizer-specific errors
#[derive(Debug, Error)]
pub enum ChannelizerError {
    #[error("requested channel frequency is outside the capture bandwidth")]
    ChannelOutOfRange,

    #[error("polyphase filter bank design failed: {reason}")]
    PfbDesignFailed { reason: String },

    #[error("decimation factor {factor} computed from fs/cbw is invalid")]
    InvalidDecimationFactor { factor: usize },
}

/// Transport-stream parsing errors. These are surfaced only for malformed
/// bounds or programmer misuse (e.g. wrong-length packet handed directly to
/// `parse_packet`); ordinary stream corruption during `parse_stream` is
/// counted, not returned as an error (see crate-level docs on propagation
/// policy).
#[derive(Debug, Error)]
pub enum TsError {
    #[error("transport packet must be exactly 188 bytes, got {actual}")]
    InvalidPacketLength { actual: usize },

    #[error("packet does not begin with sync byte 0x47")]
    MissingSyncByte,

    #[error("section bounds exceed available payload: declared {declared}, available {available}")]
    MalformedSection { declared: usize, available: usize },
}

/// PES assembly errors
#[derive(Debug, Error)]
pub enum PesError {
    #[error("no PES start code found in buffered payload")]
    NoStartCode,

    #[error("PES header truncated before header_data_length bytes")]
    TruncatedHeader,
}

/// Video decoder contract errors (§4.6 decoder state machine)
#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("unsupported stream type")]
    UnsupportedStreamType,

    #[error("{codec} {width}x{height} not supported")]
    UnsupportedConfig {
        codec: String,
        width: u32,
        height: u32,
    },

    #[error("cannot initialize decoder in configured state")]
    AlreadyConfigured,

    #[error("decoder is closed")]
    Closed,
}

/// I/Q recording container errors
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("recording metadata missing field: {field}")]
    MissingField { field: &'static str },

    #[error("recording header is malformed: {reason}")]
    MalformedHeader { reason: String },

    #[error("recording sample data is malformed: {reason}")]
    MalformedSamples { reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("invalid channel bandwidth: {bandwidth} Hz (must be > 0)")]
    InvalidChannelBandwidth { bandwidth: f64 },
}

/// Result type alias for sdrstack operations
pub type Result<T> = std::result::Result<T, SdrError>;
