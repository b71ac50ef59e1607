//! ADB backend for the device driver seam
//!
//! This module provides:
//! - `connection`: session handling and command prefixes
//! - `device`: taps, gesture replay, key events, app lifecycle, `wm size`
//! - `screenshot`: screen capture and decode
//!
//! The subprocess plumbing is async (tokio `process` + `time::timeout`);
//! [`AdbDriver`] bridges it onto the blocking [`DeviceDriver`] trait with
//! a private current-thread runtime, so the controller's worker sees plain
//! blocking calls.

mod connection;
mod device;
mod screenshot;

pub use connection::AdbConnection;

use crate::config::AdbConfig;
use crate::driver::DeviceDriver;
use crate::error::Result;
use crate::types::{Point, SwipeStep};
use image::RgbImage;
use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

/// [`DeviceDriver`] implementation backed by the `adb` binary.
pub struct AdbDriver {
    conn: AdbConnection,
    runtime: Runtime,
    serial: Mutex<String>,
}

impl AdbDriver {
    pub fn new(config: AdbConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            conn: AdbConnection::new(&config),
            runtime,
            serial: Mutex::new(String::new()),
        })
    }
}

impl DeviceDriver for AdbDriver {
    fn connect(&self) -> Result<()> {
        self.runtime.block_on(async {
            self.conn.connect().await?;
            match self.conn.serial().await {
                Ok(serial) => *self.serial.lock() = serial,
                Err(err) => warn!(%err, "connected but no serial reported"),
            }
            Ok(())
        })
    }

    fn uuid(&self) -> String {
        self.serial.lock().clone()
    }

    fn resolution(&self) -> Result<(u32, u32)> {
        self.runtime.block_on(device::screen_size(&self.conn))
    }

    fn click(&self, point: Point) -> Result<()> {
        self.runtime.block_on(device::tap(&self.conn, point))
    }

    fn swipe_steps(&self, steps: &[SwipeStep]) -> Result<()> {
        self.runtime.block_on(device::swipe_path(&self.conn, steps))
    }

    fn press_key(&self, keycode: i32) -> Result<()> {
        self.runtime.block_on(device::key_event(&self.conn, keycode))
    }

    fn screencap(&self) -> Result<RgbImage> {
        self.runtime.block_on(screenshot::capture(&self.conn))
    }

    fn start_app(&self, package: &str) -> Result<()> {
        self.runtime.block_on(device::start_app(&self.conn, package))
    }

    fn stop_app(&self, package: &str) -> Result<()> {
        self.runtime.block_on(device::stop_app(&self.conn, package))
    }
}
