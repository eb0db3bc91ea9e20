//! Broker transport abstraction over any publish/subscribe client.
//!
//! Concrete implementations:
//! - ESP-IDF MQTT client (`adapters::mqtt`, device only)
//! - [`NullTransport`] (host bring-up, no broker)
//!
//! The [`SessionController`](super::SessionController) is generic over
//! `BrokerTransport`, so swapping the client requires zero changes to
//! the session logic.  Lifecycle notifications (connected, received, ...)
//! flow back separately as [`SessionEvent`](super::SessionEvent)s.

use serde::{Deserialize, Serialize};

use crate::config::BrokerConfig;
use crate::error::TransportError;

/// Publish / subscribe delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QoS {
    /// Fire-and-forget.
    AtMostOnce,
    /// Acknowledged, may duplicate.
    AtLeastOnce,
    /// Acknowledged, exactly once.
    ExactlyOnce,
}

impl QoS {
    pub const fn level(self) -> u8 {
        self as u8
    }
}

/// Client side of a broker session.
///
/// `connect` only has to *initiate* the session; the transport reports
/// the broker's acceptance later as `SessionEvent::Connected`.  Every
/// call must return within the transport's own network timeout.
pub trait BrokerTransport {
    /// Open a connection using `config` (address, identity, credentials,
    /// keep-alive, last will).
    fn connect(&mut self, config: &BrokerConfig) -> Result<(), TransportError>;

    /// Subscribe to `topic`.
    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError>;

    /// Publish `payload` to `topic`.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError>;

    /// Close the connection.  Idempotent.
    fn disconnect(&mut self);
}

/// A transport that never reaches a broker.
/// Useful as a placeholder while no broker is configured.
pub struct NullTransport;

impl BrokerTransport for NullTransport {
    fn connect(&mut self, _config: &BrokerConfig) -> Result<(), TransportError> {
        Err(TransportError::ConnectFailed)
    }

    fn subscribe(&mut self, _topic: &str, _qos: QoS) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    fn publish(
        &mut self,
        _topic: &str,
        _payload: &[u8],
        _qos: QoS,
        _retain: bool,
    ) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    fn disconnect(&mut self) {}
}
