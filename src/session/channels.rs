//! Inter-task event queues for the network path.
//!
//! WiFi/IP event callbacks and the MQTT client callback run on
//! ESP-IDF's own tasks.  They only enqueue here; the network task owns
//! the state machine and the session controller and drains both queues.
//!
//! ```text
//! ┌──────────────┐ LinkEvent    ┌──────────────┐
//! │ sysloop cb   │─────────────▶│              │
//! └──────────────┘              │  Net task    │
//! ┌──────────────┐ SessionEvent │  (async)     │
//! │ MQTT cb      │─────────────▶│              │
//! └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::SessionEvent;
use crate::fsm::LinkEvent;

/// Depth of the link-event queue.  Link events are rare.
const LINK_DEPTH: usize = 4;

/// Depth of the session-event queue (covers a burst of fragments).
const SESSION_DEPTH: usize = 8;

pub type LinkQueue = Channel<CriticalSectionRawMutex, LinkEvent, LINK_DEPTH>;
pub type SessionQueue = Channel<CriticalSectionRawMutex, SessionEvent, SESSION_DEPTH>;

/// Link-layer events: sysloop callbacks → net task.
pub static LINK_EVENTS: LinkQueue = Channel::new();

/// Transport lifecycle events: MQTT callback → net task.
pub static SESSION_EVENTS: SessionQueue = Channel::new();

/// Queue a link event.  Returns `false` (and logs) if the queue is full.
pub fn push_link_event(event: LinkEvent) -> bool {
    if LINK_EVENTS.try_send(event).is_err() {
        warn!("Net: link event queue full, dropping {:?}", event);
        return false;
    }
    true
}

/// Queue a session event.  Returns `false` (and logs) if the queue is full.
pub fn push_session_event(event: SessionEvent) -> bool {
    match SESSION_EVENTS.try_send(event) {
        Ok(()) => true,
        Err(embassy_sync::channel::TrySendError::Full(ev)) => {
            warn!("Net: session event queue full, dropping {:?}", ev);
            false
        }
    }
}
