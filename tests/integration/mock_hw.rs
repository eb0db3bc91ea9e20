//! Mock adapters for integration tests.
//!
//! Records every transport and link call so tests can assert on the full
//! history without touching a real pin, radio or broker.

use std::sync::{Arc, Mutex};

use edgetoggle::app::events::AppEvent;
use edgetoggle::app::ports::{EventSink, LinkDriver, OutputPort};
use edgetoggle::config::BrokerConfig;
use edgetoggle::error::{HardwareError, LinkError, TransportError};
use edgetoggle::session::{BrokerTransport, QoS};
use edgetoggle::signal::EdgeSignal;

/// A fresh edge signal per test; the process-wide static would couple
/// tests running in parallel.
pub fn leaked_edge() -> &'static EdgeSignal {
    Box::leak(Box::new(EdgeSignal::new()))
}

// ── MockOutput ────────────────────────────────────────────────

pub struct MockOutput {
    pub high: bool,
    pub fail_writes: bool,
    pub writes: u32,
}

#[allow(dead_code)]
impl MockOutput {
    pub fn new(high: bool) -> Self {
        Self {
            high,
            fail_writes: false,
            writes: 0,
        }
    }

    pub fn failing(high: bool) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(high)
        }
    }
}

impl OutputPort for MockOutput {
    fn level(&mut self) -> Result<bool, HardwareError> {
        Ok(self.high)
    }

    fn set_level(&mut self, high: bool) -> Result<(), HardwareError> {
        if self.fail_writes {
            return Err(HardwareError::PinWriteFailed);
        }
        self.writes += 1;
        self.high = high;
        Ok(())
    }
}

// ── RecordingTransport ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Connect { client_id: String },
    Subscribe { topic: String, qos: QoS },
    Publish { topic: String, payload: String, qos: QoS, retain: bool },
    Disconnect,
}

/// Cloneable handle; every clone appends to the same log.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub calls: Arc<Mutex<Vec<TransportCall>>>,
    pub refuse_publish: Arc<Mutex<bool>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn publishes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Publish { topic, payload, .. } => Some((topic, payload)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn set_refuse_publish(&self, refuse: bool) {
        *self.refuse_publish.lock().unwrap() = refuse;
    }
}

impl BrokerTransport for RecordingTransport {
    fn connect(&mut self, config: &BrokerConfig) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(TransportCall::Connect {
            client_id: config.client_id.clone(),
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(TransportCall::Subscribe {
            topic: topic.to_string(),
            qos,
        });
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        if *self.refuse_publish.lock().unwrap() {
            return Err(TransportError::PublishFailed);
        }
        self.calls.lock().unwrap().push(TransportCall::Publish {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            qos,
            retain,
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.lock().unwrap().push(TransportCall::Disconnect);
    }
}

// ── MockLinkDriver ────────────────────────────────────────────

#[derive(Default)]
pub struct MockLinkDriver {
    pub starts: u32,
    pub associations: u32,
}

impl LinkDriver for MockLinkDriver {
    fn start(&mut self) -> Result<(), LinkError> {
        self.starts += 1;
        Ok(())
    }

    fn associate(&mut self) -> Result<(), LinkError> {
        self.associations += 1;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// The task owns its sink, so the log lives behind a shared handle.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
