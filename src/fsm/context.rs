//! Context threaded through every link-state handler.
//!
//! `LinkContext` borrows the two collaborators the handlers drive (the
//! WiFi driver and the session lifecycle) plus the machine's own
//! bookkeeping, which outlives any single event.

use crate::app::ports::{LinkDriver, SessionLifecycle};

/// Counters and flags kept by the state machine across events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// A session start has been issued with no matching stop yet.
    pub session_started: bool,
    /// Association requests issued (first attempt and every retry).
    pub associate_attempts: u32,
    /// Session starts issued.
    pub session_starts: u32,
    /// Session stops issued.
    pub session_stops: u32,
    /// Link-lost events that caused a transition.
    pub links_lost: u32,
}

/// Borrowed collaborators plus bookkeeping, rebuilt for every event.
pub struct LinkContext<'a> {
    pub driver: &'a mut dyn LinkDriver,
    pub session: &'a dyn SessionLifecycle,
    pub stats: &'a mut LinkStats,
}

impl LinkContext<'_> {
    /// Ask the driver to (re)associate.  A synchronous failure is logged;
    /// the stack reports the outcome through link events either way.
    pub fn request_association(&mut self) {
        self.stats.associate_attempts = self.stats.associate_attempts.wrapping_add(1);
        if let Err(e) = self.driver.associate() {
            log::warn!(
                "Link: association request {} failed: {}",
                self.stats.associate_attempts,
                e
            );
        }
    }

    /// Start the broker session.  Called only on entry to `Connected`.
    pub fn start_session(&mut self) {
        debug_assert!(!self.stats.session_started, "session started twice");
        self.session.start();
        self.stats.session_started = true;
        self.stats.session_starts = self.stats.session_starts.wrapping_add(1);
    }

    /// Stop the broker session if one was started.
    pub fn stop_session(&mut self) {
        if !self.stats.session_started {
            return;
        }
        self.session.stop();
        self.stats.session_started = false;
        self.stats.session_stops = self.stats.session_stops.wrapping_add(1);
    }
}
