//! Video decoder contract and front-end state machine (§4.6): the front-end
//! owns an external decoder implementation behind the [`VideoDecoder`]
//! trait and enforces the unconfigured/configured/closed lifecycle.

use std::time::{Duration, Instant};

use crate::errors::DecoderError;
use crate::ts::pmt::StreamType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Unconfigured,
    Configured,
    Closed,
}

/// The external video decoder boundary. Implementations are expected to
/// wrap a real hardware or software decoder; [`VideoFrontEnd`] never
/// constructs one directly.
pub trait VideoDecoder: Send {
    fn configure(&mut self, codec: StreamType, width: u32, height: u32) -> Result<(), DecoderError>;
    fn decode(&mut self, encoded_chunk: &[u8]) -> Result<(), DecoderError>;
    fn flush(&mut self) -> Result<(), DecoderError>;
    fn reset(&mut self) -> Result<(), DecoderError>;
    fn close(&mut self);
    fn is_config_supported(&self, codec: StreamType, width: u32, height: u32) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderMetrics {
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub total_decode_time: Duration,
}

impl DecoderMetrics {
    pub fn average_decode_time(&self) -> Duration {
        if self.frames_decoded == 0 {
            Duration::ZERO
        } else {
            self.total_decode_time / self.frames_decoded as u32
        }
    }
}

/// Owns a [`VideoDecoder`] and enforces the decoder contract's state
/// machine, forwarding decode errors to a caller-supplied callback (§7).
pub struct VideoFrontEnd {
    decoder: Box<dyn VideoDecoder>,
    state: DecoderState,
    metrics: DecoderMetrics,
    error_callback: Option<Box<dyn FnMut(&DecoderError) + Send>>,
}

impl VideoFrontEnd {
    pub fn new(decoder: Box<dyn VideoDecoder>) -> Self {
        Self {
            decoder,
            state: DecoderState::Unconfigured,
            metrics: DecoderMetrics::default(),
            error_callback: None,
        }
    }

    pub fn set_error_callback(&mut self, callback: Box<dyn FnMut(&DecoderError) + Send>) {
        self.error_callback = Some(callback);
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn metrics(&self) -> DecoderMetrics {
        self.metrics
    }

    fn report_error(&mut self, error: DecoderError) -> DecoderError {
        if let Some(callback) = self.error_callback.as_mut() {
            callback(&error);
        }
        error
    }

    /// `unconfigured -> configured`. Fails for non-video stream types, for
    /// an unsupported capability combination, or if already configured.
    pub fn initialize(&mut self, codec: StreamType, width: u32, height: u32) -> Result<(), DecoderError> {
        if self.state == DecoderState::Configured {
            return Err(self.report_error(DecoderError::AlreadyConfigured));
        }
        if !matches!(codec, StreamType::H264Video | StreamType::Mpeg2Video) {
            return Err(self.report_error(DecoderError::UnsupportedStreamType));
        }
        if !self.decoder.is_config_supported(codec, width, height) {
            return Err(self.report_error(DecoderError::UnsupportedConfig {
                codec: format!("{codec:?}"),
                width,
                height,
            }));
        }

        match self.decoder.configure(codec, width, height) {
            Ok(()) => {
                self.state = DecoderState::Configured;
                Ok(())
            }
            Err(err) => Err(self.report_error(err)),
        }
    }

    /// `configured -> configured`. No-op if the decoder is closed.
    pub fn process_payload(&mut self, encoded_chunk: &[u8]) -> Result<(), DecoderError> {
        if self.state == DecoderState::Closed {
            return Ok(());
        }
        if self.state != DecoderState::Configured {
            return Err(self.report_error(DecoderError::Closed));
        }

        let start = Instant::now();
        match self.decoder.decode(encoded_chunk) {
            Ok(()) => {
                self.metrics.frames_decoded += 1;
                self.metrics.total_decode_time += start.elapsed();
                Ok(())
            }
            Err(err) => {
                self.metrics.frames_dropped += 1;
                Err(self.report_error(err))
            }
        }
    }

    pub fn flush(&mut self) -> Result<(), DecoderError> {
        if self.state == DecoderState::Closed {
            return Ok(());
        }
        self.decoder.flush().map_err(|e| self.report_error(e))
    }

    pub fn reset(&mut self) -> Result<(), DecoderError> {
        if self.state == DecoderState::Closed {
            return Ok(());
        }
        self.decoder.reset().map_err(|e| self.report_error(e))
    }

    /// `any -> closed`. `process_payload` becomes a no-op afterward.
    pub fn close(&mut self) {
        self.decoder.close();
        self.state = DecoderState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct FakeDecoder {
        supported: bool,
        fail_decode: bool,
    }

    impl VideoDecoder for FakeDecoder {
        fn configure(&mut self, _codec: StreamType, _width: u32, _height: u32) -> Result<(), DecoderError> {
            Ok(())
        }
        fn decode(&mut self, _chunk: &[u8]) -> Result<(), DecoderError> {
            if self.fail_decode {
                Err(DecoderError::Closed)
            } else {
                Ok(())
            }
        }
        fn flush(&mut self) -> Result<(), DecoderError> {
            Ok(())
        }
        fn reset(&mut self) -> Result<(), DecoderError> {
            Ok(())
        }
        fn close(&mut self) {}
        fn is_config_supported(&self, _codec: StreamType, _width: u32, _height: u32) -> bool {
            self.supported
        }
    }

    fn front_end(supported: bool) -> VideoFrontEnd {
        VideoFrontEnd::new(Box::new(FakeDecoder {
            supported,
            fail_decode: false,
        }))
    }

    #[test]
    fn starts_unconfigured() {
        assert_eq!(front_end(true).state(), DecoderState::Unconfigured);
    }

    #[test]
    fn initialize_transitions_to_configured() {
        let mut fe = front_end(true);
        fe.initialize(StreamType::H264Video, 1920, 1080).unwrap();
        assert_eq!(fe.state(), DecoderState::Configured);
    }

    #[test]
    fn initialize_rejects_non_video_stream_type() {
        let mut fe = front_end(true);
        let err = fe.initialize(StreamType::Aac, 0, 0).unwrap_err();
        assert!(matches!(err, DecoderError::UnsupportedStreamType));
    }

    #[test]
    fn initialize_rejects_unsupported_config() {
        let mut fe = front_end(false);
        let err = fe.initialize(StreamType::H264Video, 7680, 4320).unwrap_err();
        assert!(matches!(err, DecoderError::UnsupportedConfig { .. }));
    }

    #[test]
    fn initialize_twice_fails() {
        let mut fe = front_end(true);
        fe.initialize(StreamType::H264Video, 1920, 1080).unwrap();
        let err = fe.initialize(StreamType::H264Video, 1920, 1080).unwrap_err();
        assert!(matches!(err, DecoderError::AlreadyConfigured));
    }

    #[test]
    fn process_payload_updates_metrics() {
        let mut fe = front_end(true);
        fe.initialize(StreamType::H264Video, 1920, 1080).unwrap();
        fe.process_payload(&[0x00]).unwrap();
        assert_eq!(fe.metrics().frames_decoded, 1);
    }

    #[test]
    fn close_makes_process_payload_a_no_op() {
        let mut fe = front_end(true);
        fe.initialize(StreamType::H264Video, 1920, 1080).unwrap();
        fe.close();
        assert_eq!(fe.state(), DecoderState::Closed);
        assert!(fe.process_payload(&[0x00]).is_ok());
        assert_eq!(fe.metrics().frames_decoded, 0);
    }

    #[test]
    fn decode_error_is_forwarded_to_callback() {
        let mut fe = VideoFrontEnd::new(Box::new(FakeDecoder {
            supported: true,
            fail_decode: true,
        }));
        fe.initialize(StreamType::H264Video, 1920, 1080).unwrap();

        let seen = Arc::new(Mutex::new(false));
        let seen_clone = seen.clone();
        fe.set_error_callback(Box::new(move |_err| {
            *seen_clone.lock().unwrap() = true;
        }));

        let result = fe.process_payload(&[0x00]);
        assert!(result.is_err());
        assert!(*seen.lock().unwrap());
        assert_eq!(fe.metrics().frames_dropped, 1);
    }
}
