use std::time::Duration;

use serde::{Serialize, Deserialize};

use super::{Error, Result};

/// Per-request values written into the IP and UDP headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketParams {
    /// UDP source port, also the port the reply is received on
    pub source_port: u16,
    /// IP time-to-live
    pub ttl: u8,
    /// IP identification field
    pub identification: u16,
}

impl Default for PacketParams {
    fn default() -> Self {
        PacketParams {
            source_port: super::DEFAULT_SOURCE_PORT,
            ttl: super::DEFAULT_TTL,
            identification: super::DEFAULT_IDENTIFICATION,
        }
    }
}

/// Configuration for one raw NTP query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Network interface whose address is used as the IP source
    pub interface: String,
    /// NTP server hostname or IPv4 address
    pub server: String,
    /// UDP source port of the request
    pub source_port: u16,
    /// NTP version announced in the request
    pub ntp_version: u8,
    /// IP time-to-live
    pub ttl: u8,
    /// IP identification placeholder
    pub identification: u16,
    /// How long to wait for the reply
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub timeout: Duration,
}

impl Config {
    /// Creates a configuration with default packet settings
    pub fn new(interface: impl Into<String>, server: impl Into<String>) -> Self {
        Config {
            interface: interface.into(),
            server: server.into(),
            ..Default::default()
        }
    }

    /// Converts a timeout given in (fractional) seconds
    pub fn timeout_from_secs(secs: f64) -> Result<Duration> {
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::config(format!("invalid timeout {}: {}", secs, e)))?;
        if timeout.is_zero() {
            return Err(Error::config("timeout must be non-zero"));
        }
        Ok(timeout)
    }

    /// Checks the configuration for values that cannot produce a valid request
    pub fn validate(&self) -> Result<()> {
        if self.interface.is_empty() {
            return Err(Error::config("interface name is empty"));
        }
        if self.server.is_empty() {
            return Err(Error::config("server is empty"));
        }
        if self.source_port == 0 {
            return Err(Error::config("source port must be non-zero"));
        }
        if !(1..=4).contains(&self.ntp_version) {
            return Err(Error::config(format!("unsupported NTP version {}", self.ntp_version)));
        }
        if self.ttl == 0 {
            return Err(Error::config("TTL must be non-zero"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be non-zero"));
        }
        Ok(())
    }

    /// Header values for the packet assembler
    pub fn packet_params(&self) -> PacketParams {
        PacketParams {
            source_port: self.source_port,
            ttl: self.ttl,
            identification: self.identification,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            interface: String::new(),
            server: String::new(),
            source_port: super::DEFAULT_SOURCE_PORT,
            ntp_version: super::DEFAULT_NTP_VERSION,
            ttl: super::DEFAULT_TTL,
            identification: super::DEFAULT_IDENTIFICATION,
            timeout: Duration::from_secs(super::DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new("eth0", "pool.ntp.org");
        assert_eq!(config.source_port, 32776);
        assert_eq!(config.ntp_version, 3);
        assert_eq!(config.ttl, 255);
        assert_eq!(config.identification, 0x0F00);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::new("eth0", "pool.ntp.org");

        let bad = Config { ntp_version: 5, ..config.clone() };
        assert!(matches!(bad.validate(), Err(Error::Config(_))));

        let bad = Config { source_port: 0, ..config.clone() };
        assert!(bad.validate().is_err());

        let bad = Config { timeout: Duration::ZERO, ..config.clone() };
        assert!(bad.validate().is_err());

        let bad = Config { interface: String::new(), ..config };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(Config::timeout_from_secs(1.5).unwrap(), Duration::from_millis(1500));
        assert!(matches!(Config::timeout_from_secs(0.0), Err(Error::Config(_))));
        assert!(matches!(Config::timeout_from_secs(-2.0), Err(Error::Config(_))));
        assert!(matches!(Config::timeout_from_secs(f64::NAN), Err(Error::Config(_))));
        assert!(matches!(Config::timeout_from_secs(1e20), Err(Error::Config(_))));
    }

    #[test]
    fn test_packet_params() {
        let config = Config {
            source_port: 40000,
            ttl: 64,
            ..Config::new("lo", "127.0.0.1")
        };
        let params = config.packet_params();
        assert_eq!(params.source_port, 40000);
        assert_eq!(params.ttl, 64);
        assert_eq!(params.identification, 0x0F00);
        assert_eq!(PacketParams::default(), Config::default().packet_params());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::new("eth0", "pool.ntp.org");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""timeout":5.0"#));

        let decoded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }
}
