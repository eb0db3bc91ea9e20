//! The output toggle loop, sole owner of the output bit.
//!
//! ```text
//!  EdgeSignal ──wait(5s)──▶ ┌──────────────────────┐ ──▶ EventSink
//!                           │   OutputToggleTask    │
//!      OutputPort ◀──flip── │   level: bool         │ ──OUT=x──▶ StatusPublisher
//!                           └──────────────────────┘
//! ```
//!
//! Every iteration waits on the edge signal with a bounded timeout.  A
//! signal flips the output; then, signalled or not, the current level is
//! published as `OUT=<0|1>` if a broker session is live.  Nothing here
//! is fatal: hardware and transport failures are reported to the sink
//! and the loop carries on.

use core::fmt::Write as _;
use core::time::Duration;

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::TransportError;
use crate::session::{Delivery, QoS};
use crate::signal::{EdgeSignal, WaitOutcome};

use super::events::AppEvent;
use super::ports::{EventSink, OutputPort, StatusPublisher};

/// Room for `OUT=0` / `OUT=1`.
pub type StatusPayload = heapless::String<8>;

/// Render the status payload for `level`.
pub fn status_payload(level: bool) -> StatusPayload {
    let mut s = StatusPayload::new();
    // Cannot overflow: at most 5 bytes.
    let _ = write!(s, "OUT={}", u8::from(level));
    s
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub outcome: WaitOutcome,
    /// Output level after this iteration.
    pub level: bool,
    /// `None` if no session was live, otherwise the publish result.
    pub published: Option<Result<Delivery, TransportError>>,
}

/// Consumer side of the edge signal.
pub struct OutputToggleTask<O, P, S> {
    output: O,
    publisher: P,
    sink: S,
    edge: &'static EdgeSignal,
    level: bool,
    wait_timeout: Duration,
    status_topic: String,
}

impl<O, P, S> OutputToggleTask<O, P, S>
where
    O: OutputPort,
    P: StatusPublisher,
    S: EventSink,
{
    /// Build the task, seeding the output bit from the pin.  If the pin
    /// cannot be read the bit starts low.
    pub fn new(
        mut output: O,
        publisher: P,
        mut sink: S,
        edge: &'static EdgeSignal,
        config: &SystemConfig,
    ) -> Self {
        let level = output.level().unwrap_or_else(|e| {
            warn!("Toggle: initial level unreadable ({}), assuming low", e);
            false
        });
        sink.emit(&AppEvent::Started { level });
        Self {
            output,
            publisher,
            sink,
            edge,
            level,
            wait_timeout: Duration::from_millis(u64::from(config.toggle.wait_timeout_ms)),
            status_topic: config.topics.status.clone(),
        }
    }

    /// Current output bit.
    pub fn level(&self) -> bool {
        self.level
    }

    /// One iteration: wait, maybe flip, maybe publish.
    pub async fn step(&mut self) -> StepReport {
        let outcome = self.edge.wait(self.wait_timeout).await;
        match outcome {
            WaitOutcome::Signaled => self.flip(),
            WaitOutcome::TimedOut => debug!("Toggle: no edge within {:?}", self.wait_timeout),
            WaitOutcome::Contended => warn!("Toggle: edge signal already has a consumer"),
        }
        let published = self.publish_status();
        StepReport {
            outcome,
            level: self.level,
            published,
        }
    }

    /// Run forever; never returns.
    pub async fn run(mut self) {
        info!(
            "Toggle: running (timeout {:?}, topic '{}')",
            self.wait_timeout, self.status_topic
        );
        loop {
            self.step().await;
        }
    }

    fn flip(&mut self) {
        let next = !self.level;
        match self.output.set_level(next) {
            Ok(()) => {
                self.level = next;
                self.sink.emit(&AppEvent::OutputToggled { level: next });
            }
            Err(e) => self.sink.emit(&AppEvent::ToggleFailed(e)),
        }
    }

    fn publish_status(&mut self) -> Option<Result<Delivery, TransportError>> {
        let handle = self.publisher.current_session()?;
        let payload = status_payload(self.level);
        let result = self.publisher.publish_on(
            handle,
            &self.status_topic,
            payload.as_bytes(),
            QoS::AtMostOnce,
            false,
        );
        match result {
            Ok(Delivery::Sent) => self.sink.emit(&AppEvent::StatusPublished { level: self.level }),
            Ok(Delivery::NoSession) => debug!("Toggle: session ended before publish"),
            Err(e) => self.sink.emit(&AppEvent::StatusPublishFailed(e)),
        }
        Some(result)
    }
}
