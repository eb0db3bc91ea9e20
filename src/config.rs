//! System configuration parameters
//!
//! All tunable parameters for the EdgeToggle firmware.  Defaults match the
//! reference board; build-time environment variables can override them
//! (see [`SystemConfig::from_build_env`]).

use serde::{Deserialize, Serialize};

use crate::adapters::wifi::{validate_password, validate_ssid};
use crate::session::transport::QoS;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub toggle: ToggleConfig,
    pub wifi: WifiConfig,
}

/// Everything the transport needs to open a broker session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker host name or IPv4 address.
    pub host: String,
    /// TCP port.  Unset means the scheme default (see [`BrokerConfig::port`]).
    pub port: Option<u16>,
    /// Use `mqtts://` instead of `mqtt://`.
    pub tls: bool,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Ask the broker to discard session state on connect.
    pub clean_session: bool,
    /// Keep-alive heartbeat period (seconds).
    pub keep_alive_secs: u16,
    pub last_will: LastWill,
}

/// Message the broker publishes on our behalf after an unclean disconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

/// Topics and fixed payloads used by the session and toggle paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Inbound commands are accepted on this topic.
    pub command: String,
    /// `OUT=<0|1>` status is published here.
    pub status: String,
    /// Published once per session after the command subscription.
    pub online_payload: String,
    /// Published when the broker acknowledges a subscription.
    pub subscribed_payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    /// Bounded wait on the edge signal per loop iteration (milliseconds).
    pub wait_timeout_ms: u32,
}

/// Station credentials.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.34.18".into(),
            port: None,
            tls: false,
            client_id: "mqtt_client_id".into(),
            username: Some("user".into()),
            password: Some("pass".into()),
            clean_session: false,
            keep_alive_secs: 120,
            last_will: LastWill::default(),
        }
    }
}

impl Default for LastWill {
    fn default() -> Self {
        Self {
            topic: "/test".into(),
            payload: "offline".into(),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            command: "/test".into(),
            status: "/test".into(),
            online_payload: "online".into(),
            subscribed_payload: "subscribed".into(),
        }
    }
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 5000,
        }
    }
}

impl BrokerConfig {
    /// Default port for the selected scheme.
    pub const fn default_port(tls: bool) -> u16 {
        if tls { 8883 } else { 1883 }
    }

    /// The configured port, or 1883/8883 depending on `tls`.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(Self::default_port(self.tls))
    }

    /// Broker URL in the form the ESP-IDF MQTT client expects.
    pub fn url(&self) -> String {
        let scheme = if self.tls { "mqtts" } else { "mqtt" };
        format!("{}://{}:{}", scheme, self.host, self.port())
    }
}

// ───────────────────────────────────────────────────────────────
// Loading
// ───────────────────────────────────────────────────────────────

/// Errors from building or validating a [`SystemConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse,
    /// A numeric override was not a number.
    BadNumber(&'static str),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse => write!(f, "config JSON could not be parsed"),
            Self::BadNumber(var) => write!(f, "{} is not a valid number", var),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep
    /// their defaults.  The result is validated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration baked in at build time.
    ///
    /// `EDGETOGGLE_CONFIG` may carry a full JSON document; individual
    /// variables (`WIFI_SSID`, `MQTT_HOST`, ...) are applied on top.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let base = match option_env!("EDGETOGGLE_CONFIG") {
            Some(json) => serde_json::from_str(json).map_err(|_| ConfigError::Parse)?,
            None => Self::default(),
        };
        base.with_overrides(|key| match key {
            "WIFI_SSID" => option_env!("WIFI_SSID"),
            "WIFI_PASSWORD" => option_env!("WIFI_PASSWORD"),
            "MQTT_HOST" => option_env!("MQTT_HOST"),
            "MQTT_PORT" => option_env!("MQTT_PORT"),
            "MQTT_TLS" => option_env!("MQTT_TLS"),
            "MQTT_CLIENT_ID" => option_env!("MQTT_CLIENT_ID"),
            "MQTT_USERNAME" => option_env!("MQTT_USERNAME"),
            "MQTT_PASSWORD" => option_env!("MQTT_PASSWORD"),
            _ => None,
        })
    }

    /// Apply key/value overrides from `lookup`, then validate.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<&'static str>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("WIFI_SSID") {
            self.wifi.ssid = v.into();
        }
        if let Some(v) = lookup("WIFI_PASSWORD") {
            self.wifi.password = v.into();
        }
        if let Some(v) = lookup("MQTT_HOST") {
            self.broker.host = v.into();
        }
        if let Some(v) = lookup("MQTT_TLS") {
            self.broker.tls = matches!(v, "1" | "true" | "yes" | "on");
        }
        if let Some(v) = lookup("MQTT_PORT") {
            self.broker.port = Some(v.parse().map_err(|_| ConfigError::BadNumber("MQTT_PORT"))?);
        }
        if let Some(v) = lookup("MQTT_CLIENT_ID") {
            self.broker.client_id = v.into();
        }
        if let Some(v) = lookup("MQTT_USERNAME") {
            self.broker.username = Some(v.into());
        }
        if let Some(v) = lookup("MQTT_PASSWORD") {
            self.broker.password = Some(v.into());
        }
        self.validate()?;
        Ok(self)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.broker;
        if b.host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker.host must not be empty"));
        }
        if b.port == Some(0) {
            return Err(ConfigError::ValidationFailed("broker.port must be non-zero"));
        }
        if b.client_id.is_empty() {
            return Err(ConfigError::ValidationFailed("broker.client_id must not be empty"));
        }
        if b.keep_alive_secs == 0 {
            return Err(ConfigError::ValidationFailed("broker.keep_alive_secs must be non-zero"));
        }
        if b.password.is_some() && b.username.is_none() {
            return Err(ConfigError::ValidationFailed("broker.password requires a username"));
        }
        if !is_publish_topic(&b.last_will.topic) {
            return Err(ConfigError::ValidationFailed("broker.last_will.topic is not a publish topic"));
        }
        if self.topics.command.is_empty() {
            return Err(ConfigError::ValidationFailed("topics.command must not be empty"));
        }
        if !is_publish_topic(&self.topics.status) {
            return Err(ConfigError::ValidationFailed("topics.status is not a publish topic"));
        }
        if self.toggle.wait_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("toggle.wait_timeout_ms must be non-zero"));
        }
        // Credentials are optional at build time (may be provisioned later),
        // but when present they must be usable.
        if !self.wifi.ssid.is_empty() {
            validate_ssid(&self.wifi.ssid)
                .map_err(|_| ConfigError::ValidationFailed("wifi.ssid must be 1-32 printable ASCII bytes"))?;
            validate_password(&self.wifi.password)
                .map_err(|_| ConfigError::ValidationFailed("wifi.password must be empty or 8-64 bytes"))?;
        }
        Ok(())
    }
}

/// Publish topics must be non-empty and free of subscription wildcards.
fn is_publish_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(['#', '+'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.broker.url(), "mqtt://192.168.34.18:1883");
        assert_eq!(c.broker.keep_alive_secs, 120);
        assert!(!c.broker.clean_session);
        assert_eq!(c.topics.command, "/test");
        assert_eq!(c.toggle.wait_timeout_ms, 5000);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = SystemConfig::from_json(
            r#"{ "broker": { "host": "broker.local", "keep_alive_secs": 30 } }"#,
        )
        .unwrap();
        assert_eq!(c.broker.host, "broker.local");
        assert_eq!(c.broker.keep_alive_secs, 30);
        assert_eq!(c.broker.port(), 1883);
        assert_eq!(c.topics.status, "/test");
    }

    #[test]
    fn json_tls_selects_secure_port() {
        let c = SystemConfig::from_json(r#"{ "broker": { "tls": true } }"#).unwrap();
        assert_eq!(c.broker.port(), 8883);
        assert_eq!(c.broker.url(), "mqtts://192.168.34.18:8883");

        let c = SystemConfig::from_json(r#"{ "broker": { "tls": true, "port": 8884 } }"#).unwrap();
        assert_eq!(c.broker.url(), "mqtts://192.168.34.18:8884");
    }

    #[test]
    fn partial_last_will_keeps_defaults() {
        let c = SystemConfig::from_json(r#"{ "broker": { "last_will": { "payload": "bye" } } }"#)
            .unwrap();
        assert_eq!(c.broker.last_will.payload, "bye");
        assert_eq!(c.broker.last_will.topic, "/test");
        assert_eq!(c.broker.last_will.qos, QoS::AtMostOnce);
        assert!(!c.broker.last_will.retain);
    }

    #[test]
    fn zero_port_rejected() {
        let r = SystemConfig::from_json(r#"{ "broker": { "port": 0 } }"#);
        assert!(matches!(r, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        assert_eq!(SystemConfig::from_json("{ nope"), Err(ConfigError::Parse));
    }

    #[test]
    fn tls_override_switches_scheme_and_port() {
        let c = SystemConfig::default()
            .with_overrides(|k| (k == "MQTT_TLS").then_some("1"))
            .unwrap();
        assert_eq!(c.broker.url(), "mqtts://192.168.34.18:8883");
    }

    #[test]
    fn explicit_port_wins_over_tls_default() {
        let c = SystemConfig::default()
            .with_overrides(|k| match k {
                "MQTT_TLS" => Some("true"),
                "MQTT_PORT" => Some("9000"),
                _ => None,
            })
            .unwrap();
        assert_eq!(c.broker.port(), 9000);
        assert_eq!(c.broker.url(), "mqtts://192.168.34.18:9000");
    }

    #[test]
    fn bad_port_override_rejected() {
        let r = SystemConfig::default().with_overrides(|k| (k == "MQTT_PORT").then_some("http"));
        assert_eq!(r, Err(ConfigError::BadNumber("MQTT_PORT")));
    }

    #[test]
    fn wildcard_status_topic_rejected() {
        let mut c = SystemConfig::default();
        c.topics.status = "/devices/+/out".into();
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn short_wifi_password_rejected() {
        let mut c = SystemConfig::default();
        c.wifi.ssid = "HomeWiFi".into();
        c.wifi.password = "short".into();
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn zero_wait_timeout_rejected() {
        let mut c = SystemConfig::default();
        c.toggle.wait_timeout_ms = 0;
        assert!(c.validate().is_err());
    }
}
