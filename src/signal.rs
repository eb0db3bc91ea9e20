//! Interrupt-to-task edge handoff.
//!
//! [`EdgeSignal`] is a single-slot, count-capped-at-one notification.
//! Producers (the GPIO ISR and the remote-command path) only ever store
//! into an atomic, so [`EdgeSignal::signal`] is safe from interrupt
//! context: it never blocks, never allocates, never takes a lock.
//!
//! The single consumer (the toggle task) polls the slot from a reactor
//! timer until the slot is set or its deadline passes.
//!
//! ```text
//! ┌─────────────┐
//! │ GPIO ISR    │──signal()──┐     ┌───────────────┐     ┌──────────────┐
//! └─────────────┘            ├────▶│ pending: bool │────▶│ Toggle task  │
//! ┌─────────────┐            │     │ (AtomicBool)  │     │ wait(timeout)│
//! │ MQTT TOGGLE │──signal()──┘     └───────────────┘     └──────────────┘
//! └─────────────┘
//! ```
//!
//! Signals raised before the consumer looks coalesce into one wakeup.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::time::Instant;

/// Upper bound on wakeup latency while the consumer is waiting.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Process-wide edge signal shared by the GPIO ISR, the session
/// controller and the toggle task.
pub static EDGE_SIGNAL: EdgeSignal = EdgeSignal::new();

/// Result of [`EdgeSignal::signal`].
#[must_use = "acknowledge the notify outcome, even if only with `let _ =`"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// The slot was empty and is now pending.
    Raised,
    /// A notification was already pending; this one coalesced into it.
    Coalesced,
}

/// Result of [`EdgeSignal::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A pending notification was consumed.
    Signaled,
    /// The timeout elapsed with nothing pending.
    TimedOut,
    /// Another consumer is already waiting; nothing was consumed.
    Contended,
}

/// Binary, ISR-safe notification slot with a single consumer.
pub struct EdgeSignal {
    pending: AtomicBool,
    waiting: AtomicBool,
}

impl Default for EdgeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            waiting: AtomicBool::new(false),
        }
    }

    /// Raise the notification.  Safe from interrupt context.
    #[inline]
    pub fn signal(&self) -> Notify {
        if self.pending.swap(true, Ordering::AcqRel) {
            Notify::Coalesced
        } else {
            Notify::Raised
        }
    }

    /// Whether a notification is pending (does not consume it).
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consume a pending notification without waiting.
    pub fn try_take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Suspend the calling task until a notification is consumed or
    /// `timeout` elapses.  Only one task may wait at a time; a second
    /// concurrent waiter gets [`WaitOutcome::Contended`] immediately.
    pub async fn wait(&self, timeout: Duration) -> WaitOutcome {
        let Some(_consumer) = ConsumerGuard::claim(&self.waiting) else {
            log::error!("EdgeSignal: second consumer rejected");
            return WaitOutcome::Contended;
        };

        let deadline = Instant::now() + timeout;
        loop {
            if self.try_take() {
                return WaitOutcome::Signaled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            async_io_mini::Timer::after((deadline - now).min(POLL_INTERVAL)).await;
        }
    }
}

// Released on every exit path of `wait`, including a dropped future.
struct ConsumerGuard<'a>(&'a AtomicBool);

impl<'a> ConsumerGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
