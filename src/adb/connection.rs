//! ADB session management for local and remote devices

use crate::config::{AdbConfig, TIMING};
use crate::error::{ControlError, Result};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Handle to one ADB endpoint. Builds correctly-prefixed commands and
/// owns the connect/serial handshake.
pub struct AdbConnection {
    adb_path: String,
    device_id: Option<String>,
    address: Option<String>,
}

impl AdbConnection {
    pub fn new(config: &AdbConfig) -> Self {
        Self {
            adb_path: config.adb_path.clone(),
            device_id: config.device_id.clone(),
            address: config.address.clone(),
        }
    }

    /// An `adb` command with the device specifier applied.
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(id) = &self.device_id {
            cmd.arg("-s").arg(id);
        }
        cmd
    }

    /// An `adb shell` command with the device specifier applied.
    pub(crate) fn shell(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("shell");
        cmd
    }

    /// Establish the session. For TCP devices this runs `adb connect`;
    /// for USB/local devices it verifies `adb get-state` reports a live
    /// device. Idempotent.
    pub async fn connect(&self) -> Result<()> {
        match &self.address {
            Some(address) => self.connect_tcp(address).await,
            None => self.check_state().await,
        }
    }

    async fn connect_tcp(&self, address: &str) -> Result<()> {
        let address = if address.contains(':') {
            address.to_string()
        } else {
            format!("{address}:5555")
        };

        let mut cmd = Command::new(&self.adb_path);
        cmd.arg("connect").arg(&address);
        let output = run_with_timeout(cmd, TIMING.connect_timeout_secs, "adb connect").await?;

        let combined = combined_output(&output).to_lowercase();
        if combined.contains("connected") {
            Ok(())
        } else {
            Err(ControlError::Driver(format!(
                "adb connect {address}: {}",
                combined.trim()
            )))
        }
    }

    async fn check_state(&self) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("get-state");
        let output = run_with_timeout(cmd, TIMING.connect_timeout_secs, "adb get-state").await?;

        let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if state == "device" {
            Ok(())
        } else {
            Err(ControlError::Driver(format!(
                "device not ready: {}",
                combined_output(&output).trim()
            )))
        }
    }

    /// The device serial, used as its stable identifier.
    pub async fn serial(&self) -> Result<String> {
        let mut cmd = self.command();
        cmd.arg("get-serialno");
        let output = run_with_timeout(cmd, TIMING.command_timeout_secs, "adb get-serialno").await?;

        let serial = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if serial.is_empty() || serial == "unknown" {
            Err(ControlError::Driver("no serial reported".to_string()))
        } else {
            Ok(serial)
        }
    }
}

/// Run a command under a timeout, surfacing expiry as [`ControlError::Timeout`].
pub(crate) async fn run_with_timeout(
    mut cmd: Command,
    timeout_secs: u64,
    what: &str,
) -> Result<Output> {
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| ControlError::Timeout(format!("{what} timed out after {timeout_secs}s")))?
        .map_err(ControlError::Io)?;
    Ok(output)
}

/// stdout and stderr as one lossy string, matching how adb scatters its
/// diagnostics across both.
pub(crate) fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
