//! Broker session lifecycle and the remote-command path.
//!
//! ```text
//! ┌──────────────┐ start/stop ┌─────────────────────┐ connect/publish ┌───────────┐
//! │ LinkStateMach│───────────▶│  SessionController  │────────────────▶│ Transport │
//! └──────────────┘            │                     │◀────────────────│ (MQTT)    │
//!                             │  slot: SessionSlot  │  SessionEvent   └───────────┘
//! ┌──────────────┐  publish_on│  assembler          │
//! │ Toggle task  │───────────▶│                     │──signal()──▶ EdgeSignal
//! └──────────────┘            └─────────────────────┘
//! ```
//!
//! Transport callbacks never call into the controller directly; they are
//! queued as [`SessionEvent`]s (see [`channels`]) and handled on the
//! network task by [`SessionController::handle_event`].

pub mod channels;
pub mod handle;
pub mod inbound;
pub mod net_task;
pub mod transport;

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::app::ports::{SessionLifecycle, StatusPublisher};
use crate::config::{BrokerConfig, TopicConfig};
use crate::error::TransportError;
use crate::signal::{EdgeSignal, Notify};

pub use handle::{Session, SessionHandle, SessionSlot};
pub use inbound::{Assembled, FragmentAssembler, InboundMessage, OwnedFragment, RemoteCommand};
pub use transport::{BrokerTransport, QoS};

/// Lifecycle notifications reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The broker accepted the first connection after `start`.
    Connected,
    /// The transport re-established a dropped connection on its own.
    Reconnected,
    /// The broker connection dropped.
    Disconnected,
    /// A subscription was acknowledged.
    Subscribed { msg_id: u32 },
    /// A publish was acknowledged (QoS > 0 only).
    Published { msg_id: u32 },
    /// One fragment of an inbound message.
    Received(OwnedFragment),
}

/// Outcome of a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport.
    Sent,
    /// No live session (or a stale handle); nothing was sent.
    NoSession,
}

struct Inner<T> {
    transport: T,
    /// `start` succeeded and `stop` has not been called since.
    open: bool,
    session: Option<Session>,
    assembler: FragmentAssembler,
}

/// Owns the one broker session.
pub struct SessionController<T: BrokerTransport> {
    broker: BrokerConfig,
    topics: TopicConfig,
    slot: SessionSlot,
    edge: &'static EdgeSignal,
    inner: Mutex<Inner<T>>,
}

impl<T: BrokerTransport> SessionController<T> {
    pub fn new(
        transport: T,
        broker: BrokerConfig,
        topics: TopicConfig,
        edge: &'static EdgeSignal,
    ) -> Self {
        Self {
            broker,
            topics,
            slot: SessionSlot::new(),
            edge,
            inner: Mutex::new(Inner {
                transport,
                open: false,
                session: None,
                assembler: FragmentAssembler::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open the transport connection.  A failure is logged and otherwise
    /// swallowed; the link state machine asks again on its next cycle.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.open {
            warn!("Session: start while already open, ignoring");
            return;
        }
        match inner.transport.connect(&self.broker) {
            Ok(()) => {
                inner.open = true;
                info!(
                    "Session: connecting to {} as '{}' (keep-alive {}s)",
                    self.broker.url(),
                    self.broker.client_id,
                    self.broker.keep_alive_secs
                );
            }
            Err(e) => warn!("Session: connect to {} failed: {}", self.broker.url(), e),
        }
    }

    /// Close the transport and forget the session.  Later publishes are
    /// no-ops until the next successful [`start`](Self::start).
    pub fn stop(&self) {
        let mut inner = self.lock();
        if !inner.open {
            debug!("Session: stop with no open transport");
            return;
        }
        inner.transport.disconnect();
        inner.open = false;
        inner.session = None;
        inner.assembler.reset();
        if let Some(h) = self.slot.clear() {
            info!("Session: {} closed", h);
        } else {
            info!("Session: transport closed");
        }
    }

    /// Whether the transport is open (the broker may not have accepted yet).
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// The live session handle, if any.
    pub fn session(&self) -> Option<SessionHandle> {
        self.slot.current()
    }

    /// Snapshot of the live session's bookkeeping.
    pub fn session_info(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    // ── Publishing ────────────────────────────────────────────

    /// Publish on whatever session is live.
    pub fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, TransportError> {
        match self.slot.current() {
            Some(h) => self.publish_on(h, topic, payload, qos, retain),
            None => Ok(Delivery::NoSession),
        }
    }

    /// Publish on `handle`.  A handle that is no longer live is treated
    /// like an absent session.
    pub fn publish_on(
        &self,
        handle: SessionHandle,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, TransportError> {
        let mut inner = self.lock();
        if !self.slot.is_current(handle) {
            debug!("Session: publish on stale {} skipped", handle);
            return Ok(Delivery::NoSession);
        }
        inner.transport.publish(topic, payload, qos, retain)?;
        Ok(Delivery::Sent)
    }

    // ── Transport events ──────────────────────────────────────

    pub fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => self.on_connected(false),
            SessionEvent::Reconnected => self.on_connected(true),
            SessionEvent::Disconnected => self.on_disconnected(),
            SessionEvent::Subscribed { msg_id } => self.on_subscribed(msg_id),
            SessionEvent::Published { msg_id } => debug!("Session: publish {} acknowledged", msg_id),
            SessionEvent::Received(fragment) => self.on_fragment(&fragment.as_message()),
        }
    }

    fn on_connected(&self, reconnect: bool) {
        let mut inner = self.lock();
        if !inner.open {
            warn!("Session: broker connect reported after stop, ignoring");
            return;
        }
        let (handle, prev) = self.slot.install();
        if let Some(prev) = prev {
            debug!("Session: {} superseded", prev);
        }
        let mut session = Session::new(handle, &self.broker);
        info!(
            "Session: {} {} to {}",
            handle,
            if reconnect { "reconnected" } else { "connected" },
            session.broker
        );

        match inner.transport.subscribe(&self.topics.command, QoS::AtMostOnce) {
            Ok(()) => {
                if !session.add_subscription(&self.topics.command) {
                    warn!("Session: subscription list full");
                }
            }
            Err(e) => warn!("Session: subscribe to '{}' failed: {}", self.topics.command, e),
        }
        if let Err(e) = inner.transport.publish(
            &self.topics.status,
            self.topics.online_payload.as_bytes(),
            QoS::AtMostOnce,
            false,
        ) {
            warn!("Session: online marker not sent: {}", e);
        }
        inner.session = Some(session);
    }

    fn on_disconnected(&self) {
        let mut inner = self.lock();
        inner.session = None;
        inner.assembler.reset();
        match self.slot.clear() {
            Some(h) => info!("Session: {} disconnected", h),
            None => debug!("Session: disconnect with no live session"),
        }
    }

    fn on_subscribed(&self, msg_id: u32) {
        info!("Session: subscription {} acknowledged", msg_id);
        let payload = self.topics.subscribed_payload.as_bytes();
        match self.publish(&self.topics.status, payload, QoS::AtMostOnce, false) {
            Ok(Delivery::Sent) => {}
            Ok(Delivery::NoSession) => debug!("Session: subscribe ack with no live session"),
            Err(e) => warn!("Session: subscribe confirmation not sent: {}", e),
        }
    }

    fn on_fragment(&self, msg: &InboundMessage<'_>) {
        if let Some(topic) = msg.topic {
            info!("Session: message on '{}'", topic);
        }
        debug!("Session: received {}/{} bytes", msg.received(), msg.total_len);

        let mut inner = self.lock();
        let command = match inner.assembler.feed(msg) {
            Ok(None) => return,
            Ok(Some(done)) => self.decode(&done),
            Err(e) => {
                warn!("Session: inbound payload dropped: {}", e);
                return;
            }
        };
        drop(inner);

        if let Some(RemoteCommand::Toggle) = command {
            match self.edge.signal() {
                Notify::Raised => info!("Session: remote TOGGLE"),
                Notify::Coalesced => info!("Session: remote TOGGLE coalesced with pending edge"),
            }
        }
    }

    fn decode(&self, done: &Assembled<'_>) -> Option<RemoteCommand> {
        if done.topic() != Some(self.topics.command.as_str()) {
            debug!("Session: {} bytes on non-command topic ignored", done.payload().len());
            return None;
        }
        let text = match done.text() {
            Ok(t) => t,
            Err(e) => {
                warn!("Session: inbound payload dropped: {}", e);
                return None;
            }
        };
        let command = RemoteCommand::parse(text);
        if command.is_none() {
            info!("Session: ignoring payload '{}'", text);
        }
        command
    }
}

impl<T: BrokerTransport> SessionLifecycle for SessionController<T> {
    fn start(&self) {
        SessionController::start(self);
    }

    fn stop(&self) {
        SessionController::stop(self);
    }
}

impl<T: BrokerTransport> StatusPublisher for SessionController<T> {
    fn current_session(&self) -> Option<SessionHandle> {
        self.session()
    }

    fn publish_on(
        &self,
        handle: SessionHandle,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, TransportError> {
        SessionController::publish_on(self, handle, topic, payload, qos, retain)
    }
}
