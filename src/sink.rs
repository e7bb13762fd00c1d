//! Publish sink: the one mutual-exclusion point between workers.
//!
//! Documents are serialized outside the lock; the lock covers only the
//! transport call, so a slow publish delays other channels' publishes but
//! never their polling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cloud::{CloudConnection, LinkState};
use crate::telemetry::{LogDocument, TelemetryDocument};
use crate::transport::Transport;

/// Cloneable handle to the shared connection, one clone per worker.
pub struct PublishSink<T> {
    connection: Arc<Mutex<CloudConnection<T>>>,
}

impl<T> Clone for PublishSink<T> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
        }
    }
}

impl<T: Transport> PublishSink<T> {
    /// Take ownership of an (already established or failed) connection.
    pub fn new(connection: CloudConnection<T>) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CloudConnection<T>> {
        // A worker panicking mid-publish leaves the connection usable
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish one telemetry document. Dropped on failure, never retried.
    pub fn send(&self, topic: &str, document: &TelemetryDocument) -> bool {
        match document.to_payload() {
            Ok(payload) => self.send_raw(topic, &payload),
            Err(_) => false,
        }
    }

    /// Publish a free-text line on the diagnostic topic.
    pub fn send_log(&self, message: &str) -> bool {
        let payload = match LogDocument::new(message).to_payload() {
            Ok(payload) => payload,
            Err(_) => return false,
        };
        let mut connection = self.lock();
        let topic = connection.diagnostic_topic();
        connection.publish(topic, &payload)
    }

    /// Publish pre-encoded bytes.
    pub fn send_raw(&self, topic: &str, payload: &[u8]) -> bool {
        self.lock().publish(topic, payload)
    }

    pub fn link_state(&self) -> LinkState {
        self.lock().link_state()
    }
}
