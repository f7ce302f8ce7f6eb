//! Broadcast descriptors and their status/quality enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a broadcast (and, mirrored, of a playlist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastStatus {
    /// Registered but not currently pulled.
    #[default]
    Created,
    /// A fetcher is actively pulling the source.
    Broadcasting,
    /// The source ended normally.
    Finished,
    /// The source ended with a persistent error.
    Error,
}

impl BroadcastStatus {
    /// Convert to the persisted string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Broadcasting => "BROADCASTING",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
        }
    }

    /// Parse from the persisted string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "BROADCASTING" => Some(Self::Broadcasting),
            "FINISHED" => Some(Self::Finished),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_broadcasting(&self) -> bool {
        matches!(self, Self::Broadcasting)
    }
}

/// Reported quality of a pulled stream.
///
/// Written by the health pass; `Poor` always goes together with zeroed
/// bitrate and frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Good,
    Average,
    Poor,
}

impl StreamQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Average => "average",
            Self::Poor => "poor",
        }
    }
}

/// Descriptor of one externally-hosted source stream.
///
/// Owned by the datastore; the manager holds a transient clone while a fetch
/// is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    /// Globally unique stream id.
    pub stream_id: String,
    /// Human-readable name.
    pub name: String,
    /// Source URL the fetcher pulls from.
    pub stream_url: String,
    pub status: BroadcastStatus,
    pub quality: StreamQuality,
    /// Measured bitrate in bits per second.
    pub bitrate: u64,
    pub frame_rate: u32,
    /// Ingest speed relative to real time (1.0 = keeping up).
    pub speed: f64,
    pub updated_at: DateTime<Utc>,
}

impl Broadcast {
    pub fn new(
        stream_id: impl Into<String>,
        name: impl Into<String>,
        stream_url: impl Into<String>,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            name: name.into(),
            stream_url: stream_url.into(),
            status: BroadcastStatus::Created,
            quality: StreamQuality::Good,
            bitrate: 0,
            frame_rate: 0,
            speed: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Record quality metrics as reported by the health pass.
    pub fn set_quality(&mut self, quality: StreamQuality, frame_rate: u32, bitrate: u64) {
        self.quality = quality;
        self.frame_rate = frame_rate;
        self.bitrate = bitrate;
        self.updated_at = Utc::now();
    }
}
