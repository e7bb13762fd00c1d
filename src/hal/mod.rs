//! Hardware Abstraction Layer for RadarTelemetryBridge.
//!
//! Thin wrappers around ESP-IDF peripherals implementing the library's
//! boundary traits. Business logic stays in core modules, HAL is just I/O.

pub mod clock;
pub mod net;
pub mod uart;

pub use clock::EspClock;
pub use net::EspTransport;
pub use uart::UartPort;
