//! Bridge configuration types.
//!
//! [`BridgeConfig`] holds every runtime setting of the bridge.  It is built
//! once at startup (defaults, then an optional TOML file, then CLI flags) and
//! handed to the composition root; nothing reads it from global state.
//!
//! ```toml
//! # remote-input.toml
//! host_ip = "192.168.1.20"
//! port_range_start = 20000
//! port_range_end = 20100
//! qr_size = 256
//! log_level = "debug"
//! ```
//!
//! Every field is optional in the file; missing fields keep their defaults.

use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First port probed when no range is configured.
pub const DEFAULT_PORT_RANGE_START: u16 = 12345;
/// Last port probed when no range is configured.
pub const DEFAULT_PORT_RANGE_END: u16 = 50000;
/// Side length requested from the QR encoder.
pub const DEFAULT_QR_SIZE: u32 = 256;

/// Error type for loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The port range is empty or inverted.
    #[error("invalid port range {start}..={end}")]
    InvalidPortRange { start: u16, end: u16 },
}

/// All runtime configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address to advertise and bind instead of discovering one.
    pub host_ip: Option<IpAddr>,

    /// First candidate port for the listener.
    pub port_range_start: u16,

    /// Last candidate port for the listener (inclusive).
    pub port_range_end: u16,

    /// File served at `GET /` instead of the embedded page.
    pub page_path: Option<PathBuf>,

    /// Requested side length of the QR matrix.
    pub qr_size: u32,

    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for BridgeConfig {
    /// | Field            | Default  |
    /// |------------------|----------|
    /// | host_ip          | discover |
    /// | port_range_start | `12345`  |
    /// | port_range_end   | `50000`  |
    /// | page_path        | embedded |
    /// | qr_size          | `256`    |
    /// | log_level        | `info`   |
    fn default() -> Self {
        Self {
            host_ip: None,
            port_range_start: DEFAULT_PORT_RANGE_START,
            port_range_end: DEFAULT_PORT_RANGE_END,
            page_path: None,
            qr_size: DEFAULT_QR_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// The candidate ports, lowest first.
    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_range_start..=self.port_range_end
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPortRange`] if the start is zero or above
    /// the end.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port_range_start == 0 || self.port_range_start > self.port_range_end {
            return Err(ConfigError::InvalidPortRange {
                start: self.port_range_start,
                end: self.port_range_end,
            });
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_range_is_12345_to_50000() {
        // Arrange / Act
        let cfg = BridgeConfig::default();
        // Assert
        assert_eq!(cfg.port_range(), 12345..=50000);
    }

    #[test]
    fn test_default_discovers_host_ip() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.host_ip, None);
    }

    #[test]
    fn test_default_validates() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let cfg = BridgeConfig {
            port_range_start: 40000,
            port_range_end: 30000,
            ..BridgeConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidPortRange {
                start: 40000,
                end: 30000
            })
        ));
    }

    #[test]
    fn test_zero_start_is_rejected() {
        let cfg = BridgeConfig {
            port_range_start: 0,
            ..BridgeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_single_port_range_is_valid() {
        let cfg = BridgeConfig {
            port_range_start: 20000,
            port_range_end: 20000,
            ..BridgeConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.port_range().count(), 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        // Arrange: only one field present
        let cfg: BridgeConfig = toml::from_str("qr_size = 128").unwrap();

        // Assert
        assert_eq!(cfg.qr_size, 128);
        assert_eq!(cfg.port_range_start, DEFAULT_PORT_RANGE_START);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_toml_host_ip_parses() {
        let cfg: BridgeConfig = toml::from_str(r#"host_ip = "192.168.1.20""#).unwrap();
        assert_eq!(cfg.host_ip, Some("192.168.1.20".parse().unwrap()));
    }
}
