//! Device control operations over `adb shell input` and friends

use crate::adb::connection::{combined_output, run_with_timeout, AdbConnection};
use crate::config::TIMING;
use crate::error::{ControlError, Result};
use crate::types::{Point, SwipeStep};
use tracing::debug;

/// Single tap at device coordinates.
pub async fn tap(conn: &AdbConnection, point: Point) -> Result<()> {
    let mut cmd = conn.shell();
    cmd.arg("input")
        .arg("tap")
        .arg(point.x.to_string())
        .arg(point.y.to_string());
    run_with_timeout(cmd, TIMING.command_timeout_secs, "input tap").await?;
    Ok(())
}

/// Replay a waypoint trajectory as consecutive short swipe segments, each
/// taking the originating waypoint's delay. A single waypoint degrades to
/// a tap.
pub async fn swipe_path(conn: &AdbConnection, steps: &[SwipeStep]) -> Result<()> {
    match steps {
        [] => Ok(()),
        [only] => tap(conn, Point::new(only.x, only.y)).await,
        _ => {
            for pair in steps.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                let mut cmd = conn.shell();
                cmd.arg("input")
                    .arg("swipe")
                    .arg(from.x.to_string())
                    .arg(from.y.to_string())
                    .arg(to.x.to_string())
                    .arg(to.y.to_string())
                    .arg(from.delay_ms.max(1).to_string());
                run_with_timeout(cmd, TIMING.command_timeout_secs, "input swipe").await?;
            }
            Ok(())
        }
    }
}

/// Single key event.
pub async fn key_event(conn: &AdbConnection, keycode: i32) -> Result<()> {
    let mut cmd = conn.shell();
    cmd.arg("input").arg("keyevent").arg(keycode.to_string());
    run_with_timeout(cmd, TIMING.command_timeout_secs, "input keyevent").await?;
    Ok(())
}

/// Native screen dimensions, from `wm size`.
pub async fn screen_size(conn: &AdbConnection) -> Result<(u32, u32)> {
    let mut cmd = conn.shell();
    cmd.arg("wm").arg("size");
    let output = run_with_timeout(cmd, TIMING.command_timeout_secs, "wm size").await?;
    parse_wm_size(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `wm size` output. Prefers the override size when the display has
/// one, else the physical size.
fn parse_wm_size(output: &str) -> Result<(u32, u32)> {
    let mut size = None;
    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let label = label.trim();
        if label == "Physical size" && size.is_none() {
            size = parse_dimensions(value);
        } else if label == "Override size" {
            size = parse_dimensions(value);
        }
    }
    size.ok_or_else(|| ControlError::Parse(format!("unrecognised wm size output: {output:?}")))
}

fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Launch an app. A plain package goes through `monkey` with the launcher
/// category; a `package/component` string is started directly.
pub async fn start_app(conn: &AdbConnection, package: &str) -> Result<()> {
    let mut cmd = conn.shell();
    if package.contains('/') {
        cmd.arg("am").arg("start").arg("-n").arg(package);
    } else {
        cmd.arg("monkey")
            .arg("-p")
            .arg(package)
            .arg("-c")
            .arg("android.intent.category.LAUNCHER")
            .arg("1");
    }

    let output = run_with_timeout(cmd, TIMING.command_timeout_secs, "start app").await?;
    let combined = combined_output(&output);
    debug!(package, output = %combined.trim(), "start app");

    if combined.contains("Error") || combined.contains("monkey aborted") {
        return Err(ControlError::Driver(format!(
            "failed to start {package}: {}",
            combined.trim()
        )));
    }
    Ok(())
}

/// Force-stop an app.
pub async fn stop_app(conn: &AdbConnection, package: &str) -> Result<()> {
    let mut cmd = conn.shell();
    cmd.arg("am").arg("force-stop").arg(package);
    run_with_timeout(cmd, TIMING.command_timeout_secs, "force-stop").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_physical_size() {
        assert_eq!(
            parse_wm_size("Physical size: 1080x1920\n").unwrap(),
            (1080, 1920)
        );
    }

    #[test]
    fn test_parse_prefers_override_size() {
        let output = "Physical size: 1440x3200\nOverride size: 1080x2400\n";
        assert_eq!(parse_wm_size(output).unwrap(), (1080, 2400));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wm_size("no size here").is_err());
        assert!(parse_wm_size("Physical size: huge").is_err());
    }
}
