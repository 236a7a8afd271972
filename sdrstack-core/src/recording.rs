//! I/Q recording container (§6): JSON and length-prefixed binary forms of a
//! metadata header followed by the interleaved sample array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RecordingError;

const BINARY_MAGIC: &[u8; 4] = b"SDRQ";
const BINARY_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub center_frequency_hz: f64,
    pub sample_rate_hz: f64,
    pub sample_count: usize,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

impl RecordingMetadata {
    pub fn validate(&self) -> Result<(), RecordingError> {
        if self.version.is_empty() {
            return Err(RecordingError::MissingField { field: "version" });
        }
        if self.sample_rate_hz <= 0.0 {
            return Err(RecordingError::MalformedHeader {
                reason: "sample_rate_hz must be positive".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IqRecording {
    pub metadata: RecordingMetadata,
    pub i: Vec<f32>,
    pub q: Vec<f32>,
}

impl IqRecording {
    pub fn new(
        center_frequency_hz: f64,
        sample_rate_hz: f64,
        i: Vec<f32>,
        q: Vec<f32>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, RecordingError> {
        if i.len() != q.len() {
            return Err(RecordingError::MalformedSamples {
                reason: format!("i/q length mismatch: {} vs {}", i.len(), q.len()),
            });
        }
        let sample_count = i.len();
        let duration_seconds = sample_count as f64 / sample_rate_hz;

        let metadata = RecordingMetadata {
            version: "1".to_string(),
            timestamp,
            center_frequency_hz,
            sample_rate_hz,
            sample_count,
            duration_seconds,
            signal_type: None,
            device_name: None,
        };
        metadata.validate()?;

        Ok(Self { metadata, i, q })
    }

    pub fn to_json(&self) -> Result<String, RecordingError> {
        serde_json::to_string(self).map_err(|e| RecordingError::MalformedHeader { reason: e.to_string() })
    }

    pub fn from_json(data: &str) -> Result<Self, RecordingError> {
        let recording: Self =
            serde_json::from_str(data).map_err(|e| RecordingError::MalformedHeader { reason: e.to_string() })?;
        recording.metadata.validate()?;
        if recording.i.len() != recording.q.len() || recording.i.len() != recording.metadata.sample_count {
            return Err(RecordingError::MalformedSamples {
                reason: "sample_count does not match i/q array lengths".into(),
            });
        }
        Ok(recording)
    }

    /// Encodes the binary form: 4-byte magic, version byte, u32-LE JSON
    /// header length, the JSON header itself, then interleaved f32-LE I/Q
    /// samples.
    pub fn to_binary(&self) -> Result<Vec<u8>, RecordingError> {
        let header_json = serde_json::to_vec(&self.metadata)
            .map_err(|e| RecordingError::MalformedHeader { reason: e.to_string() })?;

        let mut buf = Vec::with_capacity(9 + header_json.len() + self.i.len() * 8);
        buf.extend_from_slice(BINARY_MAGIC);
        buf.push(BINARY_VERSION);
        buf.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
        buf.extend_from_slice(&header_json);
        for (i, q) in self.i.iter().zip(self.q.iter()) {
            buf.extend_from_slice(&i.to_le_bytes());
            buf.extend_from_slice(&q.to_le_bytes());
        }
        Ok(buf)
    }

    pub fn from_binary(data: &[u8]) -> Result<Self, RecordingError> {
        if data.len() < 9 || &data[0..4] != BINARY_MAGIC {
            return Err(RecordingError::MalformedHeader {
                reason: "missing or invalid magic bytes".into(),
            });
        }
        let version = data[4];
        if version != BINARY_VERSION {
            return Err(RecordingError::MalformedHeader {
                reason: format!("unsupported binary version {version}"),
            });
        }
        let header_len = u32::from_le_bytes(data[5..9].try_into().unwrap()) as usize;
        if data.len() < 9 + header_len {
            return Err(RecordingError::MalformedHeader {
                reason: "header length exceeds available data".into(),
            });
        }

        let metadata: RecordingMetadata = serde_json::from_slice(&data[9..9 + header_len])
            .map_err(|e| RecordingError::MalformedHeader { reason: e.to_string() })?;
        metadata.validate()?;

        let sample_bytes = &data[9 + header_len..];
        if sample_bytes.len() % 8 != 0 {
            return Err(RecordingError::MalformedSamples {
                reason: "sample data is not a whole number of f32 I/Q pairs".into(),
            });
        }
        let sample_count = sample_bytes.len() / 8;
        if sample_count != metadata.sample_count {
            return Err(RecordingError::MalformedSamples {
                reason: format!(
                    "header declares {} samples, found {sample_count}",
                    metadata.sample_count
                ),
            });
        }

        let mut i = Vec::with_capacity(sample_count);
        let mut q = Vec::with_capacity(sample_count);
        for chunk in sample_bytes.chunks_exact(8) {
            i.push(f32::from_le_bytes(chunk[0..4].try_into().unwrap()));
            q.push(f32::from_le_bytes(chunk[4..8].try_into().unwrap()));
        }

        Ok(Self { metadata, i, q })
    }
}
