//! Inbound broker messages: fragment reassembly and command decoding.
//!
//! Large publishes are delivered by the MQTT client in several parts,
//! each carrying its byte offset and the total payload length:
//!
//! ```text
//! Fragment 1: topic="/test"  offset=0  data="TOG"  total=6
//! Fragment 2: topic=None     offset=3  data="GLE"  total=6
//! ```
//!
//! [`FragmentAssembler`] stitches them together in a fixed-capacity
//! buffer.  A complete payload is handed out as an [`Assembled`] guard
//! that clears the buffer when dropped, so the buffer is released on
//! every exit path of the caller.

use crate::error::PayloadError;

/// Reassembly buffer capacity.  Commands are short; anything larger is
/// dropped.
pub const MAX_INBOUND_PAYLOAD: usize = 256;

/// Longest topic kept for matching.
pub const MAX_TOPIC_LEN: usize = 64;

/// Borrowed view of one delivered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMessage<'a> {
    /// Present on the first fragment only.
    pub topic: Option<&'a str>,
    pub data: &'a [u8],
    /// Byte offset of `data` within the full payload.
    pub offset: usize,
    /// Length of the full payload.
    pub total_len: usize,
}

impl<'a> InboundMessage<'a> {
    /// An unfragmented message.
    pub fn complete(topic: &'a str, data: &'a [u8]) -> Self {
        Self {
            topic: Some(topic),
            data,
            offset: 0,
            total_len: data.len(),
        }
    }

    /// Bytes received so far including this fragment.
    pub fn received(&self) -> usize {
        self.offset + self.data.len()
    }
}

/// Owned copy of a fragment, for passing across tasks by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFragment {
    pub topic: Option<heapless::String<MAX_TOPIC_LEN>>,
    pub data: heapless::Vec<u8, MAX_INBOUND_PAYLOAD>,
    pub offset: usize,
    pub total_len: usize,
}

impl OwnedFragment {
    /// Copy `msg`.  An over-long topic is dropped (it can never match
    /// the command topic); over-long data is an error.
    pub fn copy_from(msg: &InboundMessage<'_>) -> Result<Self, PayloadError> {
        let data = heapless::Vec::from_slice(msg.data).map_err(|_| PayloadError::TooLarge {
            total: msg.total_len,
            capacity: MAX_INBOUND_PAYLOAD,
        })?;
        let topic = msg.topic.and_then(|t| {
            let mut s = heapless::String::new();
            s.push_str(t).ok().map(|()| s)
        });
        Ok(Self {
            topic,
            data,
            offset: msg.offset,
            total_len: msg.total_len,
        })
    }

    pub fn as_message(&self) -> InboundMessage<'_> {
        InboundMessage {
            topic: self.topic.as_deref(),
            data: &self.data,
            offset: self.offset,
            total_len: self.total_len,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Reassembly
// ───────────────────────────────────────────────────────────────

/// Fixed-capacity reassembly buffer for one in-flight payload.
pub struct FragmentAssembler {
    buf: heapless::Vec<u8, MAX_INBOUND_PAYLOAD>,
    topic: Option<heapless::String<MAX_TOPIC_LEN>>,
    total: usize,
    active: bool,
}

impl Default for FragmentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentAssembler {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            topic: None,
            total: 0,
            active: false,
        }
    }

    /// Feed one fragment.
    ///
    /// Returns `Ok(Some(_))` once the last byte of the payload has arrived,
    /// `Ok(None)` while more fragments are expected.  Any inconsistency
    /// drops the partial payload and returns the reason.
    pub fn feed(&mut self, msg: &InboundMessage<'_>) -> Result<Option<Assembled<'_>>, PayloadError> {
        if msg.offset == 0 {
            if self.active {
                log::debug!("Inbound: new message replaces {} partial bytes", self.buf.len());
            }
            self.reset();
            if msg.total_len > MAX_INBOUND_PAYLOAD {
                return Err(PayloadError::TooLarge {
                    total: msg.total_len,
                    capacity: MAX_INBOUND_PAYLOAD,
                });
            }
            self.topic = msg.topic.and_then(|t| {
                let mut s = heapless::String::new();
                s.push_str(t).ok().map(|()| s)
            });
            self.total = msg.total_len;
            self.active = true;
        } else if !self.active {
            return Err(PayloadError::Orphan { offset: msg.offset });
        } else if msg.offset != self.buf.len() {
            let expected = self.buf.len();
            self.reset();
            return Err(PayloadError::OffsetMismatch {
                expected,
                got: msg.offset,
            });
        }

        let end = msg.received();
        if end > self.total {
            let total = self.total;
            self.reset();
            return Err(PayloadError::Overrun { total, end });
        }
        if self.buf.extend_from_slice(msg.data).is_err() {
            self.reset();
            return Err(PayloadError::TooLarge {
                total: end,
                capacity: MAX_INBOUND_PAYLOAD,
            });
        }

        if self.buf.len() == self.total {
            Ok(Some(Assembled { asm: self }))
        } else {
            Ok(None)
        }
    }

    /// Discard any partial payload.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.topic = None;
        self.total = 0;
        self.active = false;
    }

    /// Whether reassembly is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bytes currently held.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

/// A complete payload borrowed from the assembler.  Dropping it empties
/// the buffer.
pub struct Assembled<'a> {
    asm: &'a mut FragmentAssembler,
}

impl Assembled<'_> {
    /// Topic from the first fragment (`None` if absent or too long).
    pub fn topic(&self) -> Option<&str> {
        self.asm.topic.as_deref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.asm.buf
    }

    /// Payload decoded as UTF-8.
    pub fn text(&self) -> Result<&str, PayloadError> {
        core::str::from_utf8(&self.asm.buf).map_err(|_| PayloadError::NotUtf8)
    }
}

impl Drop for Assembled<'_> {
    fn drop(&mut self) {
        self.asm.reset();
    }
}

// ───────────────────────────────────────────────────────────────
// Commands
// ───────────────────────────────────────────────────────────────

/// Commands accepted on the command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Flip the output, exactly as a physical edge would.
    Toggle,
}

impl RemoteCommand {
    pub const TOGGLE_TOKEN: &'static str = "TOGGLE";

    /// Exact, case-sensitive token match.
    pub fn parse(text: &str) -> Option<Self> {
        (text == Self::TOGGLE_TOKEN).then_some(Self::Toggle)
    }
}
