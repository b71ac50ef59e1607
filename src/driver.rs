//! Device driver seam
//!
//! The controller drives a device exclusively through this trait. Every
//! operation blocks and carries its own internal timeout; there is no
//! cancellation of an in-flight call. Coordinates are native device
//! pixels.

use crate::error::Result;
use crate::types::{Point, SwipeStep};
use image::RgbImage;

pub trait DeviceDriver: Send + Sync {
    /// Establish (or re-establish) the device session. Idempotent.
    fn connect(&self) -> Result<()>;

    /// Stable device identifier, e.g. the ADB serial. Empty until the
    /// first successful connect.
    fn uuid(&self) -> String;

    /// Native screen dimensions `(width, height)`.
    fn resolution(&self) -> Result<(u32, u32)>;

    /// Single tap.
    fn click(&self, point: Point) -> Result<()>;

    /// Replay a gesture, honouring each waypoint's delay.
    fn swipe_steps(&self, steps: &[SwipeStep]) -> Result<()>;

    /// Single key event.
    fn press_key(&self, keycode: i32) -> Result<()>;

    /// Capture the current screen. An empty image is an error.
    fn screencap(&self) -> Result<RgbImage>;

    fn start_app(&self, package: &str) -> Result<()>;

    fn stop_app(&self, package: &str) -> Result<()>;
}
