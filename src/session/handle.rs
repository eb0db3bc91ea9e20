//! Opaque session handle and the atomic slot that holds it.
//!
//! The active session is published to readers (the toggle task) through
//! a single `AtomicU32`: `0` means "no session", any other value is the
//! generation number of the live session.  Swapping the handle is one
//! atomic store, so readers never see a half-updated session and
//! "session absent" is a checked state rather than a dangling pointer.

use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::BrokerConfig;

/// Opaque reference to one broker session.  Stale handles (from a
/// session that has since been torn down) are rejected on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(NonZeroU32);

impl SessionHandle {
    /// Generation number, for logs.
    pub fn generation(self) -> u32 {
        self.0.get()
    }
}

impl core::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Atomic optional [`SessionHandle`].
pub struct SessionSlot {
    current: AtomicU32,
    next: AtomicU32,
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSlot {
    pub const fn new() -> Self {
        Self {
            current: AtomicU32::new(0),
            next: AtomicU32::new(1),
        }
    }

    /// The live session, if any.
    pub fn current(&self) -> Option<SessionHandle> {
        NonZeroU32::new(self.current.load(Ordering::Acquire)).map(SessionHandle)
    }

    /// Mint a fresh handle and make it current.  Returns the new handle
    /// and whatever it replaced.
    pub fn install(&self) -> (SessionHandle, Option<SessionHandle>) {
        let handle = self.mint();
        let prev = self.current.swap(handle.0.get(), Ordering::AcqRel);
        (handle, NonZeroU32::new(prev).map(SessionHandle))
    }

    /// Clear the slot, returning the handle that was live.
    pub fn clear(&self) -> Option<SessionHandle> {
        NonZeroU32::new(self.current.swap(0, Ordering::AcqRel)).map(SessionHandle)
    }

    /// Whether `handle` is still the live session.
    pub fn is_current(&self, handle: SessionHandle) -> bool {
        self.current.load(Ordering::Acquire) == handle.0.get()
    }

    fn mint(&self) -> SessionHandle {
        loop {
            let raw = self.next.fetch_add(1, Ordering::Relaxed);
            // Skip 0 after wrap-around; it means "no session".
            if let Some(nz) = NonZeroU32::new(raw) {
                return SessionHandle(nz);
            }
        }
    }
}

/// Maximum topics a session tracks as subscribed.
pub const MAX_SUBSCRIPTIONS: usize = 4;

/// Bookkeeping for the one live broker session.
#[derive(Debug, Clone)]
pub struct Session {
    pub handle: SessionHandle,
    /// `scheme://host:port` the session was opened against.
    pub broker: String,
    pub client_id: String,
    pub username: Option<String>,
    pub keep_alive_secs: u16,
    pub last_will_topic: String,
    pub last_will_payload: String,
    pub subscriptions: heapless::Vec<String, MAX_SUBSCRIPTIONS>,
}

impl Session {
    pub fn new(handle: SessionHandle, config: &BrokerConfig) -> Self {
        Self {
            handle,
            broker: config.url(),
            client_id: config.client_id.clone(),
            username: config.username.clone(),
            keep_alive_secs: config.keep_alive_secs,
            last_will_topic: config.last_will.topic.clone(),
            last_will_payload: config.last_will.payload.clone(),
            subscriptions: heapless::Vec::new(),
        }
    }

    /// Record a subscription.  Returns `false` if the list is full.
    pub fn add_subscription(&mut self, topic: &str) -> bool {
        if self.subscriptions.iter().any(|t| t == topic) {
            return true;
        }
        self.subscriptions.push(topic.into()).is_ok()
    }
}
