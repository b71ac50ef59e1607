//! Backend configuration with environment overrides
//!
//! Defaults can be overridden per process via `DROIDPILOT_*` environment
//! variables, read once at first use.

use lazy_static::lazy_static;
use std::env;

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Timeouts for the ADB backend, in seconds.
#[derive(Debug, Clone)]
pub struct AdbTimingConfig {
    pub command_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub screencap_timeout_secs: u64,
    pub pull_timeout_secs: u64,
}

impl Default for AdbTimingConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: env_u64("DROIDPILOT_COMMAND_TIMEOUT", 10),
            connect_timeout_secs: env_u64("DROIDPILOT_CONNECT_TIMEOUT", 10),
            screencap_timeout_secs: env_u64("DROIDPILOT_SCREENCAP_TIMEOUT", 10),
            pull_timeout_secs: env_u64("DROIDPILOT_PULL_TIMEOUT", 5),
        }
    }
}

lazy_static! {
    pub static ref TIMING: AdbTimingConfig = AdbTimingConfig::default();
}

/// How to reach the device.
#[derive(Debug, Clone)]
pub struct AdbConfig {
    /// Path to the `adb` binary.
    pub adb_path: String,
    /// Serial passed as `adb -s` for multi-device setups.
    pub device_id: Option<String>,
    /// TCP address for `adb connect`; USB/local when absent.
    pub address: Option<String>,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            adb_path: env::var("DROIDPILOT_ADB_PATH").unwrap_or_else(|_| "adb".to_string()),
            device_id: env::var("DROIDPILOT_DEVICE_ID").ok(),
            address: env::var("DROIDPILOT_ADB_ADDRESS").ok(),
        }
    }
}

impl AdbConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adb_path(mut self, path: impl Into<String>) -> Self {
        self.adb_path = path.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = AdbConfig {
            adb_path: "adb".to_string(),
            device_id: None,
            address: None,
        }
        .with_adb_path("/opt/adb")
        .with_device_id("emulator-5554")
        .with_address("192.168.1.20");

        assert_eq!(config.adb_path, "/opt/adb");
        assert_eq!(config.device_id.as_deref(), Some("emulator-5554"));
        assert_eq!(config.address.as_deref(), Some("192.168.1.20"));
    }
}
