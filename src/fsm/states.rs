//! Concrete link-state handlers and table builder.
//!
//! Each state is two plain `fn` pointers; no closures, no heap.
//!
//! ```text
//!  IDLE ──[StartRequested]──▶ CONNECTING ──[AddressAcquired]──▶ CONNECTED
//!                               ▲    │                             │
//!                               │ [LinkLost]                  [LinkLost]
//!                               │    ▼                             │
//!                               └─ DISCONNECTED ◀──────────────────┘
//!                          (immediate retry, no backoff)
//! ```
//!
//! Session start happens only on entry to Connected and session stop
//! only on entry to Disconnected, so every start is paired with exactly
//! one later stop.

use super::context::LinkContext;
use super::{LinkEvent, LinkState, StateDescriptor};
use log::{debug, info};

/// Build the state table.  Called once per machine.
pub fn build_state_table() -> [StateDescriptor; LinkState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: LinkState::Idle,
            name: "Idle",
            on_enter: None,
            on_event: idle_event,
        },
        // Index 1: Connecting
        StateDescriptor {
            id: LinkState::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_event: connecting_event,
        },
        // Index 2: Connected
        StateDescriptor {
            id: LinkState::Connected,
            name: "Connected",
            on_enter: Some(connected_enter),
            on_event: connected_event,
        },
        // Index 3: Disconnected
        StateDescriptor {
            id: LinkState::Disconnected,
            name: "Disconnected",
            on_enter: Some(disconnected_enter),
            on_event: disconnected_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_event(_ctx: &mut LinkContext<'_>, event: LinkEvent) -> Option<LinkState> {
    match event {
        LinkEvent::StartRequested => Some(LinkState::Connecting),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut LinkContext<'_>) -> Option<LinkState> {
    ctx.request_association();
    None
}

fn connecting_event(_ctx: &mut LinkContext<'_>, event: LinkEvent) -> Option<LinkState> {
    match event {
        LinkEvent::AddressAcquired => Some(LinkState::Connected),
        LinkEvent::LinkLost => Some(LinkState::Disconnected),
        LinkEvent::StartRequested => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED
// ═══════════════════════════════════════════════════════════════════════════

fn connected_enter(ctx: &mut LinkContext<'_>) -> Option<LinkState> {
    info!("Link: address acquired, starting broker session");
    ctx.start_session();
    None
}

fn connected_event(_ctx: &mut LinkContext<'_>, event: LinkEvent) -> Option<LinkState> {
    match event {
        LinkEvent::LinkLost => Some(LinkState::Disconnected),
        LinkEvent::AddressAcquired => {
            // Lease renewal or address change; the session rides it out.
            debug!("Link: address re-acquired while connected");
            None
        }
        LinkEvent::StartRequested => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCONNECTED
// ═══════════════════════════════════════════════════════════════════════════

fn disconnected_enter(ctx: &mut LinkContext<'_>) -> Option<LinkState> {
    ctx.stop_session();
    info!(
        "Link: lost, retrying association (attempt {})",
        ctx.stats.associate_attempts.wrapping_add(1)
    );
    Some(LinkState::Connecting)
}

// Transient: entry always chains to Connecting, so this only runs if a
// caller drives the table by hand.
fn disconnected_event(_ctx: &mut LinkContext<'_>, event: LinkEvent) -> Option<LinkState> {
    match event {
        LinkEvent::StartRequested => Some(LinkState::Connecting),
        _ => None,
    }
}
