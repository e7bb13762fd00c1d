//! Transport/security boundary.
//!
//! Network join, TLS session setup and MQTT framing live behind
//! [`Transport`]; the target implementation is `hal::net::EspTransport`.

use crate::error::TransportError;

/// Wi-Fi and TLS material.
#[derive(Clone, Default)]
pub struct Credentials {
    pub wifi_ssid: String,
    pub wifi_password: String,
    /// PEM encoded CA certificate.
    pub ca_cert: String,
    /// PEM encoded device certificate.
    pub client_cert: String,
    /// PEM encoded device private key.
    pub private_key: String,
}

// Never print key material.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("wifi_ssid", &self.wifi_ssid)
            .finish_non_exhaustive()
    }
}

/// Broker location and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Stable MQTT client identifier (thing name).
    pub client_id: String,
}

impl Endpoint {
    /// `mqtts://host:port`
    pub fn url(&self) -> String {
        format!("mqtts://{}:{}", self.host, self.port)
    }
}

/// PEM sanity check applied before any session is configured.
///
/// Returns a description of the first problem found.
pub fn check_pem(label: &str, pem: &str) -> Result<(), String> {
    let pem = pem.trim();
    if pem.is_empty() {
        return Err(format!("{} is empty", label));
    }
    if !pem.starts_with("-----BEGIN ") {
        return Err(format!("{} has no PEM header", label));
    }
    if !pem.ends_with("-----") || !pem.contains("-----END ") {
        return Err(format!("{} has no PEM footer", label));
    }
    Ok(())
}

/// Validate every PEM blob in `credentials`.
pub fn check_credentials(credentials: &Credentials) -> Result<(), String> {
    check_pem("CA certificate", &credentials.ca_cert)?;
    check_pem("client certificate", &credentials.client_cert)?;
    check_pem("private key", &credentials.private_key)?;
    Ok(())
}

/// Network + TLS + MQTT capability.
pub trait Transport: Send {
    /// One network join attempt.
    fn join_network(&mut self, ssid: &str, password: &str) -> Result<(), TransportError>;

    /// Diagnostic reachability probe of the network gateway.
    /// `None` if no probe could be made.
    fn probe_gateway(&mut self) -> Option<bool>;

    /// Install TLS material for mutual authentication.
    fn configure_session(&mut self, credentials: &Credentials, endpoint: &Endpoint) -> Result<(), TransportError>;

    /// One broker handshake attempt.
    fn connect_broker(&mut self, client_id: &str) -> bool;

    /// Enqueue one message.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Whether the client currently considers itself connected.
    fn is_connected(&self) -> bool;

    /// Tear down the broker client after the handshake ceiling is reached.
    /// Nothing may reconnect in the background afterwards.
    fn drop_session(&mut self);
}

/// Transport for a node whose network stack failed to start.
///
/// Every step fails, so a connection built on it never leaves `Down` and
/// publishes are dropped without being attempted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl Transport for Offline {
    fn join_network(&mut self, _ssid: &str, _password: &str) -> Result<(), TransportError> {
        Err(TransportError::Join("network stack unavailable".into()))
    }

    fn probe_gateway(&mut self) -> Option<bool> {
        None
    }

    fn configure_session(&mut self, _credentials: &Credentials, _endpoint: &Endpoint) -> Result<(), TransportError> {
        Err(TransportError::Session("network stack unavailable".into()))
    }

    fn connect_broker(&mut self, _client_id: &str) -> bool {
        false
    }

    fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Publish("network stack unavailable".into()))
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn drop_session(&mut self) {}
}
