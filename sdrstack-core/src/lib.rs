//! sdrstack core library
//!
//! DSP, spectrum scanning, polyphase/windowed-DFT channelization, and the
//! multi-station FM pipeline, together with MPEG-2 transport stream / PES
//! demultiplexing and a video decoder front-end contract. Modules are
//! organized by the C0-C6 component boundaries: capability context, DSP
//! primitives, channelizer, scanner, pipeline, RDS bit sync, transport
//! stream, and video.

pub mod bookmarks;
pub mod channelizer;
pub mod config;
pub mod context;
pub mod dsp;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod rds;
pub mod recording;
pub mod scanner;
pub mod ts;
pub mod video;

pub use config::SdrStackConfig;
pub use context::DspContext;
pub use errors::{Result, SdrError};
pub use pipeline::{FmPipeline, PipelineConfig};
