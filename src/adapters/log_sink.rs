//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the
//! ESP-IDF logger (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { level } => {
                info!("START  | output={}", u8::from(*level));
            }
            AppEvent::OutputToggled { level } => {
                info!("TOGGLE | output={}", u8::from(*level));
            }
            AppEvent::ToggleFailed(e) => {
                warn!("TOGGLE | failed: {}", e);
            }
            AppEvent::StatusPublished { level } => {
                info!("STATUS | OUT={} sent", u8::from(*level));
            }
            AppEvent::StatusPublishFailed(e) => {
                warn!("STATUS | publish failed: {}", e);
            }
        }
    }
}
