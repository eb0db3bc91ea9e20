//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ OutputToggleTask / LinkStateMachine
//! ```
//!
//! Driven adapters (GPIO, WiFi, broker session, event sinks) implement
//! these traits.  The domain consumes them via generics or `dyn`, so it
//! never touches hardware directly.

use std::sync::Arc;

use crate::error::{HardwareError, LinkError, TransportError};
use crate::session::{Delivery, QoS, SessionHandle};

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// The toggled digital output.  Must be readable so the loop can start
/// from the real pin level.
pub trait OutputPort {
    /// Current pin level (`true` = high).
    fn level(&mut self) -> Result<bool, HardwareError>;

    /// Drive the pin.
    fn set_level(&mut self, high: bool) -> Result<(), HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Link driver port (driven adapter: FSM → WiFi stack)
// ───────────────────────────────────────────────────────────────

/// WiFi station control.  Outcomes come back as
/// [`LinkEvent`](crate::fsm::LinkEvent)s, not as return values.
pub trait LinkDriver {
    /// Bring the station interface up.  The stack answers with
    /// `StartRequested`.
    fn start(&mut self) -> Result<(), LinkError>;

    /// Request (re)association with the configured AP.
    fn associate(&mut self) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Session ports (driven adapter: domain → broker session)
// ───────────────────────────────────────────────────────────────

/// What the link state machine may do to the broker session.
pub trait SessionLifecycle {
    fn start(&self);
    fn stop(&self);
}

/// What the toggle loop may do with the broker session.
pub trait StatusPublisher {
    /// The live session, if any.
    fn current_session(&self) -> Option<SessionHandle>;

    /// Best-effort publish on `handle`.  A stale handle yields
    /// [`Delivery::NoSession`], not an error.
    fn publish_on(
        &self,
        handle: SessionHandle,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, TransportError>;
}

impl<P: StatusPublisher + ?Sized> StatusPublisher for Arc<P> {
    fn current_session(&self) -> Option<SessionHandle> {
        (**self).current_session()
    }

    fn publish_on(
        &self,
        handle: SessionHandle,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, TransportError> {
        (**self).publish_on(handle, topic, payload, qos, retain)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
