//! Elementary-stream video handling (§4.6): PES assembly, keyframe
//! detection, and the decoder front-end contract.

pub mod decoder;
pub mod keyframe;
pub mod pes;

pub use decoder::{DecoderMetrics, DecoderState, VideoDecoder, VideoFrontEnd};
pub use keyframe::{is_h264_keyframe, is_mpeg2_keyframe};
pub use pes::{parse_pes_header, is_pes_start, PesAssembler, PesHeader};
