//! Screenshot capture for the ADB backend
//!
//! Captures to a file on the device, pulls it into a temp directory, and
//! decodes it locally. A failed or empty capture is an error; the caller
//! decides what a failed screencap job means.

use crate::adb::connection::{combined_output, run_with_timeout, AdbConnection};
use crate::config::TIMING;
use crate::error::{ControlError, Result};
use image::RgbImage;
use tempfile::tempdir;
use tracing::debug;

const REMOTE_PATH: &str = "/sdcard/droidpilot_screencap.png";

/// Capture the current screen as an RGB image.
pub async fn capture(conn: &AdbConnection) -> Result<RgbImage> {
    let temp_dir = tempdir().map_err(ControlError::Io)?;
    let local_path = temp_dir.path().join("screencap.png");

    let mut cmd = conn.shell();
    cmd.arg("screencap").arg("-p").arg(REMOTE_PATH);
    let output = run_with_timeout(cmd, TIMING.screencap_timeout_secs, "screencap").await?;

    let combined = combined_output(&output);
    debug!(output = %combined.trim(), "screencap");
    if combined.contains("Status: -1") || combined.contains("Failed") {
        return Err(ControlError::Driver(format!(
            "screencap refused: {}",
            combined.trim()
        )));
    }

    let mut cmd = conn.command();
    cmd.arg("pull").arg(REMOTE_PATH).arg(&local_path);
    let pull = run_with_timeout(cmd, TIMING.pull_timeout_secs, "screencap pull").await?;
    if !pull.status.success() {
        return Err(ControlError::Driver(format!(
            "pull failed: {}",
            combined_output(&pull).trim()
        )));
    }

    let size = std::fs::metadata(&local_path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(ControlError::EmptyScreenshot);
    }
    debug!(bytes = size, "screenshot pulled");

    let image = image::open(&local_path)?.to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(ControlError::EmptyScreenshot);
    }

    debug!(
        width = image.width(),
        height = image.height(),
        "screenshot decoded"
    );
    Ok(image)
}
