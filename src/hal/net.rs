//! Wi-Fi station + MQTT over mutual TLS.
//!
//! Implements [`Transport`] with `esp-idf-svc`. The MQTT connection event
//! loop runs on its own thread and only tracks the connected flag.
//!
//! esp-mqtt's auto-reconnect is off: each broker attempt builds a fresh
//! client, and a lost connection stays lost.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::ping::{self, EspPing};
use esp_idf_svc::sys::EspError;
use esp_idf_svc::tls::X509;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::error::TransportError;
use crate::transport::{Credentials, Endpoint, Transport};

/// How long one broker handshake attempt waits for CONNACK.
const CONNECT_WAIT: Duration = Duration::from_secs(5);

/// Poll step while waiting for CONNACK.
const CONNECT_POLL: Duration = Duration::from_millis(100);

/// Stack for the MQTT event thread.
const EVENT_STACK_SIZE: usize = 6 * 1024;

/// TLS material in the `'static` NUL-terminated form the MQTT client wants.
struct TlsMaterial {
    ca_cert: X509<'static>,
    client_cert: X509<'static>,
    private_key: X509<'static>,
}

/// Convert PEM text to a leaked NUL-terminated buffer.
///
/// Runs once per boot during session setup.
fn leak_pem(pem: &str) -> X509<'static> {
    let mut bytes = pem.trim().as_bytes().to_vec();
    bytes.push(0);
    X509::pem_until_nul(Box::leak(bytes.into_boxed_slice()))
}

pub struct EspTransport {
    wifi: BlockingWifi<EspWifi<'static>>,
    wifi_started: bool,
    url: String,
    tls: Option<TlsMaterial>,
    client: Option<EspMqttClient<'static>>,
    connected: Arc<AtomicBool>,
}

impl EspTransport {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, EspError> {
        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), nvs)?, sysloop)?;
        Ok(Self {
            wifi,
            wifi_started: false,
            url: String::new(),
            tls: None,
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    fn start_wifi(&mut self, ssid: &str, password: &str) -> Result<(), TransportError> {
        let join = |e: EspError| TransportError::Join(e.to_string());
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| TransportError::Join("ssid too long".into()))?,
            password: password
                .try_into()
                .map_err(|_| TransportError::Join("password too long".into()))?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        self.wifi.set_configuration(&config).map_err(join)?;
        self.wifi.start().map_err(join)?;
        self.wifi_started = true;
        Ok(())
    }

    /// Spawn the thread draining MQTT connection events into `connected`.
    fn spawn_event_loop(
        mut connection: EspMqttConnection,
        connected: Arc<AtomicBool>,
    ) -> Result<(), TransportError> {
        thread::Builder::new()
            .name("mqtt-events".into())
            .stack_size(EVENT_STACK_SIZE)
            .spawn(move || {
                while let Ok(event) = connection.next() {
                    match event.payload() {
                        EventPayload::Connected(_) => connected.store(true, Ordering::Release),
                        EventPayload::Disconnected => connected.store(false, Ordering::Release),
                        _ => {}
                    }
                }
                connected.store(false, Ordering::Release);
            })
            .map(|_| ())
            .map_err(|e| TransportError::Session(e.to_string()))
    }
}

impl Transport for EspTransport {
    fn join_network(&mut self, ssid: &str, password: &str) -> Result<(), TransportError> {
        if !self.wifi_started {
            self.start_wifi(ssid, password)?;
        }
        let join = |e: EspError| TransportError::Join(e.to_string());
        self.wifi.connect().map_err(join)?;
        self.wifi.wait_netif_up().map_err(join)?;
        Ok(())
    }

    fn probe_gateway(&mut self) -> Option<bool> {
        let ip_info = self.wifi.wifi().sta_netif().get_ip_info().ok()?;
        EspPing::default()
            .ping(ip_info.subnet.gateway, &ping::Configuration::default())
            .ok()
            .map(|summary| summary.received > 0)
    }

    fn configure_session(&mut self, credentials: &Credentials, endpoint: &Endpoint) -> Result<(), TransportError> {
        self.tls = Some(TlsMaterial {
            ca_cert: leak_pem(&credentials.ca_cert),
            client_cert: leak_pem(&credentials.client_cert),
            private_key: leak_pem(&credentials.private_key),
        });
        self.url = endpoint.url();
        Ok(())
    }

    fn connect_broker(&mut self, client_id: &str) -> bool {
        // Previous attempt's client stops and its event thread exits
        self.drop_session();
        let Some(tls) = self.tls.as_ref() else {
            return false;
        };
        let config = MqttClientConfiguration {
            client_id: Some(client_id),
            server_certificate: Some(tls.ca_cert),
            client_certificate: Some(tls.client_cert),
            private_key: Some(tls.private_key),
            disable_auto_reconnect: true,
            ..Default::default()
        };
        // Fresh flag per client so a stale event thread cannot flip it
        let connected = Arc::new(AtomicBool::new(false));
        match EspMqttClient::new(&self.url, &config) {
            Ok((client, connection)) => {
                if Self::spawn_event_loop(connection, Arc::clone(&connected)).is_err() {
                    return false;
                }
                self.client = Some(client);
                self.connected = connected;
            }
            Err(_) => return false,
        }

        // One attempt is one bounded wait for the connected event
        let mut waited = Duration::ZERO;
        while waited < CONNECT_WAIT {
            if self.is_connected() {
                return true;
            }
            thread::sleep(CONNECT_POLL);
            waited += CONNECT_POLL;
        }
        self.is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| TransportError::Publish("no client".into()))?;
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|e| TransportError::Publish(e.to_string()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn drop_session(&mut self) {
        self.client = None;
        self.connected.store(false, Ordering::Release);
    }
}
