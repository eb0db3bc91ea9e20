//! Outbound application events.
//!
//! [`OutputToggleTask`](super::toggle::OutputToggleTask) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them (serial log today).

use crate::error::{HardwareError, TransportError};

/// Structured side-effects of the toggle loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The loop started with the output at `level`.
    Started { level: bool },

    /// The output was flipped and now reads `level`.
    OutputToggled { level: bool },

    /// Flipping the output failed; the level is unchanged.
    ToggleFailed(HardwareError),

    /// `OUT=<level>` was handed to the broker.
    StatusPublished { level: bool },

    /// The status publish was rejected by the transport.
    StatusPublishFailed(TransportError),
}
