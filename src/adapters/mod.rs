//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements       | Connects to                 |
//! |--------------|------------------|-----------------------------|
//! | `log_sink`   | EventSink        | Serial log output           |
//! | `mqtt`       | BrokerTransport  | ESP-IDF MQTT client         |
//! | `output_pin` | OutputPort       | Any `embedded-hal` out pin  |
//! | `wifi`       | LinkDriver       | ESP-IDF WiFi STA            |

pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod mqtt;
pub mod output_pin;
pub mod wifi;
