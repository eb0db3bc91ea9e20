//! Application core: the toggle loop and the port traits it runs against.
//!
//! The loop owns the output bit and talks to hardware, the broker session
//! and the log only through the traits in [`ports`], so it runs unchanged
//! against mocks on the host.

pub mod events;
pub mod ports;
pub mod toggle;
