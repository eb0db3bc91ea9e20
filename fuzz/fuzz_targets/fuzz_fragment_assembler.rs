//! Fuzz target: `FragmentAssembler::feed`
//!
//! Slices arbitrary input into a stream of (offset, total, data) fragments
//! and asserts that the assembler never panics, never buffers more than
//! its fixed capacity, and always accepts a fresh message after a reset.
//!
//! cargo fuzz run fuzz_fragment_assembler

#![no_main]

use edgetoggle::session::inbound::MAX_INBOUND_PAYLOAD;
use edgetoggle::session::{FragmentAssembler, InboundMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut asm = FragmentAssembler::new();
    let mut rest = data;

    // Each record: offset (u16 LE), total (u16 LE), len (u8), then `len` bytes.
    while rest.len() >= 5 {
        let offset = usize::from(u16::from_le_bytes([rest[0], rest[1]]));
        let total_len = usize::from(u16::from_le_bytes([rest[2], rest[3]]));
        let len = usize::from(rest[4]).min(rest.len() - 5);
        let chunk = &rest[5..5 + len];
        rest = &rest[5 + len..];

        let msg = InboundMessage {
            topic: if offset == 0 { Some("/test") } else { None },
            data: chunk,
            offset,
            total_len,
        };
        if let Ok(Some(done)) = asm.feed(&msg) {
            assert!(done.payload().len() <= MAX_INBOUND_PAYLOAD);
            let _ = done.text();
        }
        assert!(asm.buffered() <= MAX_INBOUND_PAYLOAD);
    }

    asm.reset();
    assert!(!asm.is_active());
    let fresh = InboundMessage::complete("/test", b"TOGGLE");
    assert!(matches!(asm.feed(&fresh), Ok(Some(_))));
});
