//! Telemetry documents and their JSON encoding.
//!
//! A document mirrors the optionality of the reading it came from: a field
//! whose detection flag is clear is omitted, never sent empty.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::error::EncodeError;
use crate::reading::{SensorFrame, TargetRecord};

/// Suffix appended to `status` for channels that never answered the handshake.
pub const UNVERIFIED_SUFFIX: &str = " (link unverified)";

/// Moving or stationary target object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDocument {
    pub signal: u8,
    pub distance: u16,
    pub signals: Vec<u8>,
    pub thresholds: Vec<u8>,
}

impl From<&TargetRecord> for TargetDocument {
    fn from(record: &TargetRecord) -> Self {
        Self {
            signal: record.signal,
            distance: record.distance,
            signals: record.signals.clone(),
            thresholds: record.thresholds.clone(),
        }
    }
}

/// Document published on the telemetry topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryDocument {
    pub sensor_id: u8,
    pub status: String,
    pub enhanced_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving_target: Option<TargetDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stationary_target: Option<TargetDocument>,
}

impl TelemetryDocument {
    /// Serialize to the wire payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a wire payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self, EncodeError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Document published on the diagnostic topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDocument {
    pub message: String,
}

impl LogDocument {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Encode one frame from `channel` into a telemetry document.
///
/// `link_verified` is the channel's bring-up readiness; when false the
/// status carries [`UNVERIFIED_SUFFIX`]. `enhanced_mode` is the channel's
/// negotiated mode, used for frames that carry no mode of their own.
pub fn encode(
    frame: &SensorFrame,
    channel: ChannelId,
    link_verified: bool,
    enhanced_mode: bool,
) -> TelemetryDocument {
    let mut doc = match frame {
        SensorFrame::Data(reading) => TelemetryDocument {
            sensor_id: channel.get(),
            status: reading.status.label().to_string(),
            enhanced_mode: reading.enhanced_mode,
            presence_detected: Some(reading.presence_detected),
            distance: if reading.presence_detected {
                reading.distance
            } else {
                None
            },
            moving_target: reading.moving.as_ref().map(TargetDocument::from),
            stationary_target: reading.stationary.as_ref().map(TargetDocument::from),
        },
        SensorFrame::Unrecognized { code } => TelemetryDocument {
            sensor_id: channel.get(),
            status: format!("unrecognized frame 0x{:02X}", code),
            enhanced_mode,
            presence_detected: None,
            distance: None,
            moving_target: None,
            stationary_target: None,
        },
    };

    if !link_verified {
        doc.status.push_str(UNVERIFIED_SUFFIX);
    }
    doc
}
