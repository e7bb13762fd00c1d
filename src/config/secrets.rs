//! Build-time secrets.
//!
//! Populated by build.rs from `BRIDGE_*` environment variables. Unset values
//! compile to empty strings; empty credentials are rejected when the TLS
//! session is configured.

use crate::transport::{Credentials, Endpoint};

pub const WIFI_SSID: &str = env!("BRIDGE_WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("BRIDGE_WIFI_PASSWORD");
pub const MQTT_ENDPOINT: &str = env!("BRIDGE_MQTT_ENDPOINT");
pub const THING_NAME: &str = env!("BRIDGE_THING_NAME");

pub const CA_CERT: &str = include_str!(concat!(env!("OUT_DIR"), "/ca_cert.pem"));
pub const CLIENT_CERT: &str = include_str!(concat!(env!("OUT_DIR"), "/client_cert.pem"));
pub const PRIVATE_KEY: &str = include_str!(concat!(env!("OUT_DIR"), "/private_key.pem"));

/// Credentials compiled into this image.
pub fn credentials() -> Credentials {
    Credentials {
        wifi_ssid: WIFI_SSID.into(),
        wifi_password: WIFI_PASSWORD.into(),
        ca_cert: CA_CERT.into(),
        client_cert: CLIENT_CERT.into(),
        private_key: PRIVATE_KEY.into(),
    }
}

/// Broker endpoint compiled into this image.
pub fn endpoint() -> Endpoint {
    Endpoint {
        host: MQTT_ENDPOINT.into(),
        port: super::BROKER_PORT,
        client_id: THING_NAME.into(),
    }
}
