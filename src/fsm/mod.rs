//! Function-pointer finite state machine for the WiFi link lifecycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │  StateTable                                        │
//! │  ┌──────────────┬───────────┬────────────────────┐ │
//! │  │ LinkState    │ on_enter  │ on_event           │ │
//! │  ├──────────────┼───────────┼────────────────────┤ │
//! │  │ Idle         │ -         │ fn(ctx,ev)->Option │ │
//! │  │ Connecting   │ fn(ctx)   │ fn(ctx,ev)->Option │ │
//! │  │ Connected    │ fn(ctx)   │ fn(ctx,ev)->Option │ │
//! │  │ Disconnected │ fn(ctx)   │ fn(ctx,ev)->Option │ │
//! │  └──────────────┴───────────┴────────────────────┘ │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Each event is offered to `on_event` of the **current** state.  If it
//! returns `Some(next)`, the engine updates the current pointer, then runs
//! `on_enter` for the next state.  Leaving a state has no side effects.  An
//! `on_enter` may itself return a follow-up state (Disconnected chains
//! straight into Connecting); the engine follows such chains.

pub mod context;
pub mod states;

use context::{LinkContext, LinkStats};
use log::{debug, info, warn};

use crate::app::ports::{LinkDriver, SessionLifecycle};

// ---------------------------------------------------------------------------
// State and event identity
// ---------------------------------------------------------------------------

/// WiFi association lifecycle.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LinkState {
    Idle = 0,
    Connecting = 1,
    Connected = 2,
    Disconnected = 3,
}

impl LinkState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `LinkState`.  Out-of-range indices assert
    /// in debug builds and fall back to `Idle`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Disconnected,
            _ => {
                debug_assert!(false, "invalid link state index: {idx}");
                Self::Idle
            }
        }
    }
}

/// Link-layer events, as delivered by the WiFi/IP stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkEvent {
    /// Station interface started.
    StartRequested,
    /// DHCP lease obtained.
    AddressAcquired,
    /// Station disassociated.
    LinkLost,
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` action.  May return a follow-up state to chain into.
pub type StateEnterFn = fn(&mut LinkContext<'_>) -> Option<LinkState>;

/// Event handler.  `Some(next)` requests a transition; `None` ignores it.
pub type StateEventFn = fn(&mut LinkContext<'_>, LinkEvent) -> Option<LinkState>;

/// Static descriptor for a single state.
pub struct StateDescriptor {
    pub id: LinkState,
    pub name: &'static str,
    pub on_enter: Option<StateEnterFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The link state machine.  Runs for the process lifetime; no state is
/// terminal.
pub struct LinkStateMachine {
    table: [StateDescriptor; LinkState::COUNT],
    current: usize,
    stats: LinkStats,
}

impl Default for LinkStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStateMachine {
    /// A machine in `Idle` with the standard table.
    pub fn new() -> Self {
        Self {
            table: states::build_state_table(),
            current: LinkState::Idle as usize,
            stats: LinkStats::default(),
        }
    }

    pub fn current_state(&self) -> LinkState {
        LinkState::from_index(self.current)
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Feed one link event.  Returns the state the machine settled in.
    pub fn handle(
        &mut self,
        event: LinkEvent,
        driver: &mut dyn LinkDriver,
        session: &dyn SessionLifecycle,
    ) -> LinkState {
        let mut ctx = LinkContext {
            driver,
            session,
            stats: &mut self.stats,
        };
        let next = (self.table[self.current].on_event)(&mut ctx, event);
        match next {
            Some(next) => {
                if event == LinkEvent::LinkLost {
                    ctx.stats.links_lost = ctx.stats.links_lost.wrapping_add(1);
                }
                Self::transition(&self.table, &mut self.current, next, &mut ctx);
            }
            None => debug!(
                "Link: {:?} ignored in {}",
                event, self.table[self.current].name
            ),
        }
        self.current_state()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(
        table: &[StateDescriptor; LinkState::COUNT],
        current: &mut usize,
        first: LinkState,
        ctx: &mut LinkContext<'_>,
    ) {
        let mut next = first;
        // Enter-chains are at most one hop per state.
        for _ in 0..LinkState::COUNT {
            let next_idx = next as usize;
            info!("Link: {} -> {}", table[*current].name, table[next_idx].name);
            *current = next_idx;

            match table[next_idx].on_enter.and_then(|enter| enter(ctx)) {
                Some(follow) => next = follow,
                None => return,
            }
        }
        warn!("Link: enter chain did not settle in {}", table[*current].name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use std::cell::Cell;

    #[derive(Default)]
    struct Driver {
        associations: u32,
    }

    impl LinkDriver for Driver {
        fn start(&mut self) -> Result<(), LinkError> {
            Ok(())
        }

        fn associate(&mut self) -> Result<(), LinkError> {
            self.associations += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Lifecycle {
        starts: Cell<u32>,
        stops: Cell<u32>,
    }

    impl SessionLifecycle for Lifecycle {
        fn start(&self) {
            self.starts.set(self.starts.get() + 1);
        }

        fn stop(&self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    #[test]
    fn starts_in_idle() {
        assert_eq!(LinkStateMachine::new().current_state(), LinkState::Idle);
    }

    #[test]
    fn start_request_associates() {
        let mut fsm = LinkStateMachine::new();
        let (mut d, s) = (Driver::default(), Lifecycle::default());
        assert_eq!(fsm.handle(LinkEvent::StartRequested, &mut d, &s), LinkState::Connecting);
        assert_eq!(d.associations, 1);
        assert_eq!(s.starts.get(), 0);
    }

    #[test]
    fn address_starts_session() {
        let mut fsm = LinkStateMachine::new();
        let (mut d, s) = (Driver::default(), Lifecycle::default());
        fsm.handle(LinkEvent::StartRequested, &mut d, &s);
        assert_eq!(fsm.handle(LinkEvent::AddressAcquired, &mut d, &s), LinkState::Connected);
        assert_eq!(s.starts.get(), 1);
    }

    #[test]
    fn link_lost_stops_session_and_retries_immediately() {
        let mut fsm = LinkStateMachine::new();
        let (mut d, s) = (Driver::default(), Lifecycle::default());
        fsm.handle(LinkEvent::StartRequested, &mut d, &s);
        fsm.handle(LinkEvent::AddressAcquired, &mut d, &s);
        assert_eq!(fsm.handle(LinkEvent::LinkLost, &mut d, &s), LinkState::Connecting);
        assert_eq!(s.stops.get(), 1);
        assert_eq!(d.associations, 2);
        assert_eq!(fsm.stats().links_lost, 1);
    }

    #[test]
    fn link_lost_while_connecting_does_not_stop() {
        let mut fsm = LinkStateMachine::new();
        let (mut d, s) = (Driver::default(), Lifecycle::default());
        fsm.handle(LinkEvent::StartRequested, &mut d, &s);
        assert_eq!(fsm.handle(LinkEvent::LinkLost, &mut d, &s), LinkState::Connecting);
        assert_eq!(s.stops.get(), 0);
        assert_eq!(d.associations, 2);
    }

    #[test]
    fn events_out_of_table_are_ignored() {
        let mut fsm = LinkStateMachine::new();
        let (mut d, s) = (Driver::default(), Lifecycle::default());
        assert_eq!(fsm.handle(LinkEvent::AddressAcquired, &mut d, &s), LinkState::Idle);
        assert_eq!(fsm.handle(LinkEvent::LinkLost, &mut d, &s), LinkState::Idle);
        assert_eq!(d.associations, 0);
        assert_eq!(s.starts.get() + s.stops.get(), 0);
    }

    #[test]
    fn second_address_while_connected_keeps_one_session() {
        let mut fsm = LinkStateMachine::new();
        let (mut d, s) = (Driver::default(), Lifecycle::default());
        fsm.handle(LinkEvent::StartRequested, &mut d, &s);
        fsm.handle(LinkEvent::AddressAcquired, &mut d, &s);
        fsm.handle(LinkEvent::AddressAcquired, &mut d, &s);
        assert_eq!(s.starts.get(), 1);
    }

    #[test]
    fn from_index_roundtrips() {
        for idx in 0..LinkState::COUNT {
            assert_eq!(LinkState::from_index(idx) as usize, idx);
        }
    }
}
