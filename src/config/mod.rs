//! Module: config
//!
//! Purpose: Deployment configuration for RadarTelemetryBridge.
//!
//! Architecture:
//! - Channel count is fixed at build time (no discovery); UART pin wiring
//!   lives with the typed peripherals in the binary's startup code
//! - Retry ceilings and delays live in [`ConnectPolicy`] / [`BringupPolicy`]
//! - Secrets are injected by build.rs, see [`secrets`]

use core::time::Duration;

use crate::ld2410::baud_index;
use crate::logging::LogLevel;

pub mod secrets;

/// Topic for periodic per-channel telemetry documents.
pub const TELEMETRY_TOPIC: &str = "esp32/pub";

/// Topic for free-text diagnostic log lines.
pub const DIAGNOSTIC_TOPIC: &str = "esp32/lg";

/// MQTT over TLS port.
pub const BROKER_PORT: u16 = 8883;

/// Baud rate of every radar UART.
pub const SENSOR_BAUD_RATE: u32 = 256_000;

/// Poll period of every acquisition worker.
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(500);

/// Number of radar channels wired to the board.
pub const NUM_CHANNELS: usize = 3;

/// Retry policy for the cloud connection bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Delay between network join attempts (join itself is unbounded).
    pub join_delay: Duration,
    /// Broker handshake ceiling.
    pub broker_attempts: u32,
    /// Fixed delay between broker handshake attempts.
    pub broker_delay: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            join_delay: Duration::from_millis(500),
            broker_attempts: 5,
            broker_delay: Duration::from_secs(2),
        }
    }
}

/// Retry policy for one channel bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupPolicy {
    /// Delay before touching the channel at all.
    pub settle: Duration,
    pub handshake_attempts: u32,
    pub handshake_delay: Duration,
    pub enhanced_attempts: u32,
    pub enhanced_delay: Duration,
    pub baud_attempts: u32,
    pub baud_delay: Duration,
}

impl Default for BringupPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            handshake_attempts: 3,
            handshake_delay: Duration::from_secs(2),
            enhanced_attempts: 3,
            enhanced_delay: Duration::from_secs(1),
            baud_attempts: 5,
            baud_delay: Duration::from_secs(1),
        }
    }
}

/// One radar channel, in bring-up order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Channel identity, 1-based.
    pub id: u8,
    /// Host side UART baud rate.
    pub baud: u32,
}

pub const CHANNELS: [ChannelConfig; NUM_CHANNELS] = [
    ChannelConfig { id: 1, baud: SENSOR_BAUD_RATE },
    ChannelConfig { id: 2, baud: SENSOR_BAUD_RATE },
    ChannelConfig { id: 3, baud: SENSOR_BAUD_RATE },
];

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub telemetry_topic: &'static str,
    pub diagnostic_topic: &'static str,
    pub sample_period: Duration,
    pub connect: ConnectPolicy,
    pub bringup: BringupPolicy,
    pub channels: [ChannelConfig; NUM_CHANNELS],
    /// Sensor baud rate requested after bring-up.
    /// `None` leaves the sensor at its current rate.
    pub reporting_baud: Option<u32>,
    /// Stack size of every worker thread, in bytes.
    pub worker_stack_size: usize,
    /// Log entries at or above this level are mirrored to the diagnostic topic.
    pub mirror_level: LogLevel,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            telemetry_topic: TELEMETRY_TOPIC,
            diagnostic_topic: DIAGNOSTIC_TOPIC,
            sample_period: SAMPLE_PERIOD,
            connect: ConnectPolicy::default(),
            bringup: BringupPolicy::default(),
            channels: CHANNELS,
            reporting_baud: None,
            worker_stack_size: 10_000,
            mirror_level: LogLevel::Warn,
        }
    }
}

impl BridgeConfig {
    /// LD2410 rate code for `reporting_baud`. `Err` carries a rate the
    /// sensor does not support.
    pub fn reporting_rate(&self) -> Option<Result<u16, u32>> {
        self.reporting_baud
            .map(|baud| baud_index(baud).ok_or(baud))
    }
}
