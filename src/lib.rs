//! EdgeToggle firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod session;
pub mod signal;
pub mod time_driver;

// Host tests take their clock from embassy-time's std driver.
#[cfg(all(test, not(target_os = "espidf")))]
use embassy_time as _;

// ESP-IDF-backed adapters and drivers; host builds get simulation stubs.
pub mod adapters;
pub mod drivers;
