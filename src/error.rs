//! Error types for the EdgeToggle firmware, one enum per subsystem.
//!
//! All variants are `Copy` so they can be passed through event sinks and
//! logs without allocation.  Each implements `core::error::Error`, so
//! `main` can lift any of them into `anyhow::Error` with `?`.
//!
//! None of these errors is fatal: the firmware keeps running in a
//! degraded state (no session, stale output) and keeps recovering.

use core::fmt;

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// Reading the pin level failed.
    PinReadFailed,
    /// Driving the pin level failed.
    PinWriteFailed,
    /// `gpio_config` rejected a pin configuration (ESP-IDF return code).
    GpioConfigFailed(i32),
    /// The GPIO ISR service could not be installed or the handler added.
    IsrInstallFailed(i32),
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinReadFailed => write!(f, "GPIO read failed"),
            Self::PinWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR install failed (rc={rc})"),
        }
    }
}

impl core::error::Error for HardwareError {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The broker was unreachable or rejected the connection.
    ConnectFailed,
    /// An operation was attempted with no open transport.
    NotConnected,
    /// The transport refused or failed a publish.
    PublishFailed,
    /// The transport refused or failed a subscribe.
    SubscribeFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::NotConnected => write!(f, "transport not connected"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::SubscribeFailed => write!(f, "MQTT subscribe failed"),
        }
    }
}

impl core::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No station credentials are configured.
    NoCredentials,
    /// SSID is empty, longer than 32 bytes, or not printable ASCII.
    InvalidSsid,
    /// Password is neither empty (open network) nor 8-64 bytes.
    InvalidPassword,
    /// The driver refused to start the station.
    StartFailed,
    /// The driver refused an association request.
    AssociationFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes, or empty for open)")
            }
            Self::StartFailed => write!(f, "WiFi station start failed"),
            Self::AssociationFailed => write!(f, "WiFi association request failed"),
        }
    }
}

impl core::error::Error for LinkError {}

// ---------------------------------------------------------------------------
// Inbound payload errors
// ---------------------------------------------------------------------------

/// Reasons an inbound (possibly fragmented) payload was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// A fragment did not start where the previous one ended.
    OffsetMismatch { expected: usize, got: usize },
    /// A continuation fragment arrived with no reassembly in progress.
    Orphan { offset: usize },
    /// The announced total does not fit the reassembly buffer.
    TooLarge { total: usize, capacity: usize },
    /// A fragment would overrun the announced total length.
    Overrun { total: usize, end: usize },
    /// The reassembled payload is not valid UTF-8.
    NotUtf8,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OffsetMismatch { expected, got } => {
                write!(f, "fragment offset {got}, expected {expected}")
            }
            Self::Orphan { offset } => write!(f, "orphan fragment at offset {offset}"),
            Self::TooLarge { total, capacity } => {
                write!(f, "payload of {total} bytes exceeds {capacity}-byte buffer")
            }
            Self::Overrun { total, end } => {
                write!(f, "fragment ends at {end}, past total {total}")
            }
            Self::NotUtf8 => write!(f, "payload is not UTF-8"),
        }
    }
}

impl core::error::Error for PayloadError {}
