//! ESP-IDF MQTT client as a [`BrokerTransport`].
//!
//! The client runs its own task and reports everything through one
//! callback.  The callback never touches the session controller: it
//! turns each event into a [`SessionEvent`] and queues it for the net
//! task (see [`crate::session::channels`]).
//!
//! The first `Connected` after [`connect`](BrokerTransport::connect) is
//! reported as `Connected`; later ones come from the client's own
//! auto-reconnect and are reported as `Reconnected`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration,
    QoS as EspQoS,
};
use log::{debug, error, warn};

use crate::config::BrokerConfig;
use crate::error::TransportError;
use crate::session::channels::push_session_event;
use crate::session::{BrokerTransport, InboundMessage, OwnedFragment, QoS, SessionEvent};

fn esp_qos(qos: QoS) -> EspQoS {
    match qos {
        QoS::AtMostOnce => EspQoS::AtMostOnce,
        QoS::AtLeastOnce => EspQoS::AtLeastOnce,
        QoS::ExactlyOnce => EspQoS::ExactlyOnce,
    }
}

/// Broker transport backed by `esp_idf_svc::mqtt::client::EspMqttClient`.
#[derive(Default)]
pub struct EspMqttTransport {
    client: Option<EspMqttClient<'static>>,
}

impl EspMqttTransport {
    pub fn new() -> Self {
        Self { client: None }
    }
}

impl BrokerTransport for EspMqttTransport {
    fn connect(&mut self, config: &BrokerConfig) -> Result<(), TransportError> {
        self.disconnect();

        let conf = MqttClientConfiguration {
            client_id: Some(&config.client_id),
            username: config.username.as_deref(),
            password: config.password.as_deref(),
            disable_clean_session: !config.clean_session,
            keep_alive_interval: Some(Duration::from_secs(u64::from(config.keep_alive_secs))),
            lwt: Some(LwtConfiguration {
                topic: &config.last_will.topic,
                payload: config.last_will.payload.as_bytes(),
                qos: esp_qos(config.last_will.qos),
                retain: config.last_will.retain,
            }),
            ..Default::default()
        };

        let seen_connect = Arc::new(AtomicBool::new(false));
        let client = EspMqttClient::new_cb(&config.url(), &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    let ev = if seen_connect.swap(true, Ordering::AcqRel) {
                        SessionEvent::Reconnected
                    } else {
                        SessionEvent::Connected
                    };
                    push_session_event(ev);
                }
                EventPayload::Disconnected => {
                    push_session_event(SessionEvent::Disconnected);
                }
                EventPayload::Subscribed(msg_id) => {
                    push_session_event(SessionEvent::Subscribed { msg_id });
                }
                EventPayload::Published(msg_id) => {
                    push_session_event(SessionEvent::Published { msg_id });
                }
                EventPayload::Received {
                    topic,
                    data,
                    details,
                    ..
                } => {
                    let (offset, total_len) = match details {
                        Details::Complete => (0, data.len()),
                        Details::InitialChunk(c) => (0, c.total_data_size),
                        Details::SubsequentChunk(c) => (c.current_data_offset, c.total_data_size),
                    };
                    let msg = InboundMessage {
                        topic,
                        data,
                        offset,
                        total_len,
                    };
                    match OwnedFragment::copy_from(&msg) {
                        Ok(fragment) => {
                            push_session_event(SessionEvent::Received(fragment));
                        }
                        Err(e) => warn!("MQTT: fragment dropped: {}", e),
                    }
                }
                EventPayload::Error(e) => error!("MQTT: client error: {:?}", e),
                other => debug!("MQTT: {:?}", other),
            }
        })
        .map_err(|e| {
            error!("MQTT: client init failed: {:?}", e);
            TransportError::ConnectFailed
        })?;

        self.client = Some(client);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        let client = self.client.as_mut().ok_or(TransportError::NotConnected)?;
        client
            .subscribe(topic, esp_qos(qos))
            .map(|msg_id| debug!("MQTT: subscribe '{}' queued (msg {})", topic, msg_id))
            .map_err(|_| TransportError::SubscribeFailed)
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        let client = self.client.as_mut().ok_or(TransportError::NotConnected)?;
        // `enqueue` hands the message to the client task instead of
        // writing the socket on this thread.
        client
            .enqueue(topic, esp_qos(qos), retain, payload)
            .map(|msg_id| debug!("MQTT: publish to '{}' queued (msg {})", topic, msg_id))
            .map_err(|_| TransportError::PublishFailed)
    }

    fn disconnect(&mut self) {
        // Dropping the client stops its task and frees the handle.
        if self.client.take().is_some() {
            debug!("MQTT: client destroyed");
        }
    }
}
