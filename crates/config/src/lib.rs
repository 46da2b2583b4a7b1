//! Bridge Configuration Management
//!
//! Loads the translator configuration from a `key = value` text file.
//! Lines starting with `#` are comments. Unknown keys are ignored and
//! values that fail to parse fall back to their defaults with a warning,
//! except for the version settings, which fail the load.

mod blocked;

pub use blocked::{BlockedVersions, VersionRule};

use bridge_core::{BridgeError, ProtocolVersion, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/bridge.txt";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Version the server behind the translator speaks (from "server-version")
    pub server_version: ProtocolVersion,
    /// Client versions refused at handshake (from "blocked-versions")
    pub blocked_versions: BlockedVersions,
    /// Disconnect reason for blocked clients (from "blocked-disconnect-msg")
    pub blocked_disconnect_msg: String,
    /// Log remapper failures at debug instead of warn (from "suppress-conversion-warnings")
    pub suppress_conversion_warnings: bool,

    // Packet rate limiting; -1 disables a limit
    /// Packets per second that kick immediately (from "max-pps")
    pub max_pps: i32,
    /// Kick reason; `%pps` is replaced with the measured rate (from "max-pps-kick-msg")
    pub max_pps_kick_msg: String,
    /// Seconds per warning window (from "tracking-period")
    pub tracking_period: u64,
    /// Average packets per second over a window that count as a warning (from "warning-pps")
    pub warning_pps: i32,
    /// Warnings tolerated before a kick (from "max-warnings")
    pub max_warnings: i32,
    /// Kick reason after too many warnings (from "max-warnings-kick-msg")
    pub max_warnings_kick_msg: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_version: ProtocolVersion::V1_20_2,
            blocked_versions: BlockedVersions::default(),
            blocked_disconnect_msg: "You are using an unsupported Minecraft version!".into(),
            suppress_conversion_warnings: false,
            max_pps: 800,
            max_pps_kick_msg: "You are sending too many packets!".into(),
            tracking_period: 6,
            warning_pps: 120,
            max_warnings: 4,
            max_warnings_kick_msg: "You are sending too many packets, :(".into(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `Config` if a version setting is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration from [`DEFAULT_CONFIG_PATH`]
    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Parse configuration file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();
                config.parse_option(key, value)?;
            }
        }

        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server-version" => {
                self.server_version = ProtocolVersion::parse(value).ok_or_else(|| {
                    BridgeError::Config(format!("invalid server-version: {}", value))
                })?;
            }
            "blocked-versions" => {
                self.blocked_versions = BlockedVersions::parse(value)?;
            }
            "blocked-disconnect-msg" => self.blocked_disconnect_msg = value.into(),
            "suppress-conversion-warnings" => {
                self.suppress_conversion_warnings = parse_or(key, value, false);
            }
            "max-pps" => {
                self.max_pps = parse_or(key, value, 800);
            }
            "max-pps-kick-msg" => self.max_pps_kick_msg = value.into(),
            "tracking-period" => {
                self.tracking_period = parse_or(key, value, 6);
            }
            "warning-pps" => {
                self.warning_pps = parse_or(key, value, 120);
            }
            "max-warnings" => {
                self.max_warnings = parse_or(key, value, 4);
            }
            "max-warnings-kick-msg" => self.max_warnings_kick_msg = value.into(),
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
        Ok(())
    }

    /// Whether a client of `version` may connect
    pub fn is_blocked(&self, version: ProtocolVersion) -> bool {
        self.blocked_versions.contains(version)
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Bridge configuration:");
        tracing::info!("  Server version: {}", self.server_version);
        if self.blocked_versions.is_empty() {
            tracing::info!("  Blocked versions: none");
        } else {
            tracing::info!("  Blocked versions: {}", self.blocked_versions);
        }
        tracing::info!("  Suppress conversion warnings: {}", self.suppress_conversion_warnings);
        if self.max_pps < 0 {
            tracing::info!("  Max PPS: disabled");
        } else {
            tracing::info!("  Max PPS: {}", self.max_pps);
        }
        if self.warning_pps < 0 {
            tracing::info!("  Warnings: disabled");
        } else {
            tracing::info!(
                "  Warnings: {} pps over {}s, kick after {}",
                self.warning_pps,
                self.tracking_period,
                self.max_warnings
            );
        }
    }
}

/// Parse `value`, or warn and keep `default`
fn parse_or<T: FromStr + fmt::Display>(key: &str, value: &str, default: T) -> T {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value for {}: {:?}, using {}", key, value, default);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.server_version, ProtocolVersion::V1_20_2);
        assert_eq!(config.max_pps, 800);
        assert_eq!(config.tracking_period, 6);
        assert!(config.blocked_versions.is_empty());
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# translator settings
server-version = 1.20.3
blocked-versions = <1.20.3, 767
max-pps = -1
warning-pps = nonsense
suppress-conversion-warnings = true
"#;
        let config = BridgeConfig::parse(config_text).unwrap();
        assert_eq!(config.server_version, ProtocolVersion::V1_20_3);
        assert!(config.is_blocked(ProtocolVersion::V1_20_2));
        assert!(config.is_blocked(ProtocolVersion::V1_21));
        assert!(!config.is_blocked(ProtocolVersion::V1_20_5));
        assert_eq!(config.max_pps, -1);
        assert_eq!(config.warning_pps, 120);
        assert!(config.suppress_conversion_warnings);
    }

    #[test]
    fn test_unparsable_value_warns() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || {
            BridgeConfig::parse("max-warnings = lots\nmax-pps = 5").unwrap()
        });
        assert_eq!(config.max_warnings, 4);
        assert_eq!(config.max_pps, 5);

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("max-warnings"));
        assert!(!output.contains("max-pps"));
    }

    #[test]
    fn test_invalid_server_version() {
        let err = BridgeConfig::parse("server-version = 1.99").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server-version = 766").unwrap();
        writeln!(file, "max-pps-kick-msg = Slow down (%pps)").unwrap();

        let config = BridgeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.server_version, ProtocolVersion::V1_20_5);
        assert_eq!(config.max_pps_kick_msg, "Slow down (%pps)");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load_from_file(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
