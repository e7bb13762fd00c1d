//! Cloud connection bring-up and publish gate.
//!
//! ```text
//! join network ──▶ probe gateway ──▶ configure TLS ──▶ broker handshake ──▶ Ready
//!  (unbounded,       (diagnostic      (no retry,        (≤5, 2s apart)
//!   500ms apart)      only)            fatal on error)       │ exhausted
//!                                                            ▼
//!                                                     PublishDisabled
//! ```
//!
//! There is no reconnect loop: once established, the connection is used
//! opportunistically for the rest of the process lifetime. Exhausting the
//! broker ceiling tears the client down so it cannot come back on its own.

use crate::clock::Clock;
use crate::config::ConnectPolicy;
use crate::error::ConnectError;
use crate::logging::DiagStream;
use crate::retry::{retry_bounded, retry_forever};
use crate::telemetry::LogDocument;
use crate::transport::{check_credentials, Credentials, Endpoint, Transport};
use crate::{diag_debug, diag_error, diag_info, diag_warn};

/// Message announced on the diagnostic topic once the broker accepts us.
pub const LIVENESS_MESSAGE: &str = concat!(env!("VERSION_STRING"), " online");

/// Prerequisite chain: network, then session, then broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub network_joined: bool,
    pub session_established: bool,
    pub broker_connected: bool,
}

/// Externally visible publish capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// `establish` has not run yet.
    Down,
    /// Establishment failed; publishes are accepted and dropped.
    PublishDisabled,
    /// Broker session established.
    Ready,
}

/// Successful establishment summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ready {
    pub join_attempts: u32,
    pub broker_attempts: u32,
    pub gateway_reachable: Option<bool>,
}

/// The single shared link to the broker.
pub struct CloudConnection<T> {
    transport: T,
    diagnostic_topic: &'static str,
    state: ConnectionState,
    link: LinkState,
}

impl<T: Transport> CloudConnection<T> {
    pub fn new(transport: T, diagnostic_topic: &'static str) -> Self {
        Self {
            transport,
            diagnostic_topic,
            state: ConnectionState::default(),
            link: LinkState::Down,
        }
    }

    /// Run the full establishment sequence.
    ///
    /// On any error the connection is left publish-disabled; the caller logs
    /// and carries on.
    pub fn establish<C, const N: usize>(
        &mut self,
        credentials: &Credentials,
        endpoint: &Endpoint,
        policy: &ConnectPolicy,
        clock: &C,
        log: &DiagStream<N>,
    ) -> Result<Ready, ConnectError>
    where
        C: Clock + ?Sized,
    {
        // Nothing is meaningful without a network: retry until joined
        diag_info!(log, clock.now_us(), "Connecting to Wi-Fi '{}'", credentials.wifi_ssid);
        let transport = &mut self.transport;
        let join_attempts = retry_forever(clock, policy.join_delay, |attempt| {
            match transport.join_network(&credentials.wifi_ssid, &credentials.wifi_password) {
                Ok(()) => true,
                Err(e) => {
                    diag_debug!(log, clock.now_us(), "join attempt {}: {}", attempt, e);
                    false
                }
            }
        });
        self.state.network_joined = true;
        diag_info!(log, clock.now_us(), "Wi-Fi connected after {} attempt(s)", join_attempts);

        let gateway_reachable = self.transport.probe_gateway();
        match gateway_reachable {
            Some(ok) => diag_info!(log, clock.now_us(), "Ping result: {}", ok),
            None => diag_info!(log, clock.now_us(), "Ping skipped"),
        }

        // Mutual TLS, no retry
        let session = check_credentials(credentials).and_then(|()| {
            self.transport
                .configure_session(credentials, endpoint)
                .map_err(|e| e.to_string())
        });
        if let Err(reason) = session {
            diag_error!(log, clock.now_us(), "TLS setup failed: {}", reason);
            self.link = LinkState::PublishDisabled;
            return Err(ConnectError::Credentials(reason));
        }
        self.state.session_established = true;

        diag_info!(log, clock.now_us(), "Connecting to {}", endpoint.url());
        let transport = &mut self.transport;
        let broker = retry_bounded(clock, policy.broker_attempts, policy.broker_delay, |attempt| {
            let ok = transport.connect_broker(&endpoint.client_id);
            if !ok {
                diag_info!(log, clock.now_us(), "Broker attempt {} failed", attempt);
            }
            ok
        });
        if !broker.is_success() {
            diag_error!(
                log,
                clock.now_us(),
                "Failed to connect to broker after {} attempts",
                broker.attempts()
            );
            self.transport.drop_session();
            self.link = LinkState::PublishDisabled;
            return Err(ConnectError::BrokerUnreachable {
                attempts: broker.attempts(),
            });
        }

        self.state.broker_connected = true;
        self.link = LinkState::Ready;
        diag_info!(log, clock.now_us(), "Broker connected");

        match LogDocument::new(LIVENESS_MESSAGE).to_payload() {
            Ok(payload) => {
                if !self.publish(self.diagnostic_topic, &payload) {
                    diag_warn!(log, clock.now_us(), "liveness announcement not delivered");
                }
            }
            Err(e) => diag_warn!(log, clock.now_us(), "{}", e),
        }

        Ok(Ready {
            join_attempts,
            broker_attempts: broker.attempts(),
            gateway_reachable,
        })
    }

    /// Enqueue `payload` on `topic`.
    ///
    /// Returns whether the client considered itself connected at the time of
    /// the call. Always `false`, without touching the transport, unless the
    /// connection was established.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if self.link != LinkState::Ready {
            return false;
        }
        match self.transport.publish(topic, payload) {
            Ok(()) => self.transport.is_connected(),
            Err(_) => false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn is_publish_enabled(&self) -> bool {
        self.link == LinkState::Ready
    }

    pub fn diagnostic_topic(&self) -> &'static str {
        self.diagnostic_topic
    }
}
