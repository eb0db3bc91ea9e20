//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real GPIO, WiFi or broker required.

// Clock for `EdgeSignal::wait`.
use embassy_time as _;

mod link_session_tests;
mod mock_hw;
mod toggle_flow_tests;
