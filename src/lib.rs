//! # RadarTelemetryBridge
//!
//! Multi-channel LD2410 radar acquisition with MQTT/TLS republishing.
//!
//! ## Architecture
//!
//! ```text
//!  radar 1 ──▶ AcquisitionWorker ──┐
//!  radar 2 ──▶ AcquisitionWorker ──┼──▶ PublishSink ──▶ CloudConnection ──▶ broker
//!  radar 3 ──▶ AcquisitionWorker ──┘     (mutex)
//! ```
//!
//! - Bring-up (cloud, then each channel in order) runs once, single threaded
//! - Each worker owns its channel; the sink is the only shared object
//! - Failures degrade (publish-disabled, unready channel), never halt
//!
//! Hardware glue lives in `hal` and is only built for ESP-IDF targets.

pub mod bringup;
pub mod channel;
pub mod clock;
pub mod cloud;
pub mod config;
pub mod error;
pub mod ld2410;
pub mod link;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod reading;
pub mod retry;
pub mod sink;
pub mod telemetry;
pub mod transport;
pub mod worker;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use bringup::{adapt_reporting_rate, bring_up, bring_up_all, BringupReport};
pub use channel::{ChannelId, SensorChannel};
pub use clock::{Clock, SystemClock};
pub use cloud::{CloudConnection, ConnectionState, LinkState};
pub use config::BridgeConfig;
pub use error::{BringupError, ConnectError, LinkError, TransportError};
pub use link::ChannelLink;
pub use log_globals::DIAG_LOG;
pub use reading::{ChannelReading, SensorFrame, TargetRecord, TargetStatus};
pub use sink::PublishSink;
pub use telemetry::{encode, TelemetryDocument};
pub use transport::{Credentials, Endpoint, Offline, Transport};
pub use worker::{AcquisitionWorker, CycleOutcome, WorkerConfig, WorkerState};
