//! WiFi station-mode adapter.
//!
//! Implements [`LinkDriver`], the hexagonal boundary for the link layer.
//! The adapter only *requests* things of the stack; outcomes arrive as
//! system-event-loop callbacks, which are translated into
//! [`LinkEvent`](crate::fsm::LinkEvent)s and queued for the net task:
//!
//! | Stack event              | Link event        |
//! |--------------------------|-------------------|
//! | `WifiEvent::StaStarted`  | `StartRequested`  |
//! | `IpEvent::DhcpIpAssigned`| `AddressAcquired` |
//! | `WifiEvent::StaDisconnected` | `LinkLost`    |
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` plus two
//!   sysloop subscriptions.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! None here.  The link state machine re-requests association on every
//! link loss, immediately and without bound.

use log::info;

use crate::app::ports::LinkDriver;
use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Space through tilde; the stack accepts raw bytes but the log and the
/// config file do not.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// 1-32 printable ASCII bytes.
pub fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

/// Empty (open network) or 8-64 bytes (WPA2 passphrase or PSK hex).
pub fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    _subscriptions: [esp_idf_svc::eventloop::EspSubscription<'static, esp_idf_svc::eventloop::System>; 2],
    /// Simulation: association requests seen.
    #[cfg(not(target_os = "espidf"))]
    sim_associations: u32,
    started: bool,
}

impl WifiAdapter {
    /// Host simulation.  No stack events are produced.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_associations: 0,
            started: false,
        }
    }

    /// Take the modem and hook the WiFi/IP events into the link queue.
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        use crate::fsm::LinkEvent;
        use crate::session::channels::push_link_event;
        use esp_idf_svc::netif::IpEvent;
        use esp_idf_svc::wifi::{EspWifi, WifiEvent};

        let wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;

        let wifi_sub = sysloop.subscribe::<WifiEvent, _>(|event| match event {
            WifiEvent::StaStarted { .. } => {
                push_link_event(LinkEvent::StartRequested);
            }
            WifiEvent::StaDisconnected { .. } => {
                push_link_event(LinkEvent::LinkLost);
            }
            _ => {}
        })?;
        let ip_sub = sysloop.subscribe::<IpEvent, _>(|event| {
            if let IpEvent::DhcpIpAssigned { .. } = event {
                push_link_event(LinkEvent::AddressAcquired);
            }
        })?;

        Ok(Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
            _subscriptions: [wifi_sub, ip_sub],
            started: false,
        })
    }

    /// Store station credentials after validating them.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| LinkError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| LinkError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| LinkError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .map_err(|_| LinkError::StartFailed)?;
        self.wifi.start().map_err(|_| LinkError::StartFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        info!("WiFi(sim): station started");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_associate(&mut self) -> Result<(), LinkError> {
        self.wifi.connect().map_err(|_| LinkError::AssociationFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_associate(&mut self) -> Result<(), LinkError> {
        self.sim_associations = self.sim_associations.wrapping_add(1);
        info!("WiFi(sim): associating (request {})", self.sim_associations);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkDriver
// ───────────────────────────────────────────────────────────────

impl LinkDriver for WifiAdapter {
    fn start(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        self.platform_start()?;
        self.started = true;
        info!("WiFi: station starting, SSID='{}'", self.ssid);
        Ok(())
    }

    fn associate(&mut self) -> Result<(), LinkError> {
        if !self.started {
            return Err(LinkError::StartFailed);
        }
        self.platform_associate()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
