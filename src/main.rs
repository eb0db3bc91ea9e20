//! EdgeToggle firmware entry point.
//!
//! Hexagonal architecture: an interrupt-driven toggle task on Core 1 and
//! an event-driven network task on Core 0.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HalOutput      LogEventSink   WifiAdapter    EspMqttTransport │
//! │  (OutputPort)   (EventSink)    (LinkDriver)   (BrokerTransport)│
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  GPIO ISR ──▶ EdgeSignal ──▶ OutputToggleTask   (Core 1)       │
//! │  sysloop ──▶ LinkStateMachine ──▶ SessionController (Core 0)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use edgetoggle::adapters::log_sink::LogEventSink;
use edgetoggle::adapters::mqtt::EspMqttTransport;
use edgetoggle::adapters::output_pin::HalOutput;
use edgetoggle::adapters::wifi::WifiAdapter;
use edgetoggle::app::toggle::OutputToggleTask;
use edgetoggle::config::SystemConfig;
use edgetoggle::drivers::{hw_init, task_pin};
use edgetoggle::session::{SessionController, net_task};
use edgetoggle::signal::EDGE_SIGNAL;

fn log_banner() {
    // SAFETY: both are plain getters; the version string is static.
    let (heap, idf) = unsafe {
        (
            esp_idf_svc::sys::esp_get_free_heap_size(),
            core::ffi::CStr::from_ptr(esp_idf_svc::sys::esp_get_idf_version()),
        )
    };
    info!("╔══════════════════════════════════════╗");
    info!("║  EdgeToggle v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Free heap: {} bytes, IDF {}", heap, idf.to_string_lossy());
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    log_banner();

    // ── 2. Configuration ──────────────────────────────────────
    let config = match SystemConfig::from_build_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Build-time config rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    info!("Broker: {} as '{}'", config.broker.url(), config.broker.client_id);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Input/output mode so the level can be read back.
    let output = HalOutput::new(PinDriver::input_output(peripherals.pins.gpio23)?);

    // ── 4. Session controller ─────────────────────────────────
    let session = Arc::new(SessionController::new(
        EspMqttTransport::new(),
        config.broker.clone(),
        config.topics.clone(),
        &EDGE_SIGNAL,
    ));

    // ── 5. Toggle task (Core 1) ───────────────────────────────
    let toggle = OutputToggleTask::new(output, session.clone(), LogEventSink::new(), &EDGE_SIGNAL, &config);
    task_pin::spawn_on_core(task_pin::Core::App, 5, 8, "toggle\0", move || {
        futures_lite::future::block_on(toggle.run())
    })?;

    // ── 6. Edge interrupt ─────────────────────────────────────
    if let Err(e) = hw_init::init_edge_input() {
        // The remote TOGGLE path still works without the ISR.
        error!("Edge input init failed: {}, continuing without ISR", e);
    }

    // ── 7. WiFi + net task (Core 0) ───────────────────────────
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, Some(nvs))?;
    if let Err(e) = wifi.set_credentials(&config.wifi.ssid, &config.wifi.password) {
        error!("WiFi credentials rejected: {}, link will stay idle", e);
    }
    net_task::spawn(wifi, session)?;

    info!("Startup complete");
    loop {
        std::thread::park();
    }
}
