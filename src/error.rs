//! Error taxonomy.
//!
//! Nothing here terminates the process. Every error is handled where it
//! occurs: logged, a degraded flag set, and the pipeline keeps going.

use thiserror::Error;

use crate::bringup::BringupReport;

/// Cloud connection establishment failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Malformed or missing TLS material. Not retried.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// Broker handshake ceiling exhausted.
    #[error("broker unreachable after {attempts} attempts")]
    BrokerUnreachable { attempts: u32 },
}

impl ConnectError {
    /// Short stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "C01",
            Self::BrokerUnreachable { .. } => "C02",
        }
    }
}

/// Channel bring-up failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BringupError {
    /// One or both bring-up phases exhausted their ceiling.
    /// The channel is still handed to its worker.
    #[error("channel degraded (ready={}, enhanced={})", .0.ready, .0.enhanced_mode)]
    Degraded(BringupReport),

    /// Reporting-rate change refused on every attempt.
    #[error("reporting rate rejected after {attempts} attempts")]
    BaudRejected { attempts: u32 },
}

impl BringupError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Degraded(_) => "B01",
            Self::BaudRejected { .. } => "B02",
        }
    }
}

/// Transient channel read failure. Skips one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("no data")]
    NoData,
    #[error("read timed out")]
    Timeout,
    #[error("malformed frame: {0}")]
    Malformed(&'static str),
    #[error("serial i/o: {0}")]
    Io(String),
}

/// Failure reported by the transport/security collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network join failed: {0}")]
    Join(String),
    #[error("session setup failed: {0}")]
    Session(String),
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Document serialization failure.
#[derive(Debug, Error)]
#[error("telemetry encoding failed: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);
