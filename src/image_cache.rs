//! Most-recent screenshot cache
//!
//! Written only by the controller's worker thread; any thread may read.
//! Readers get deep copies so the lock is never held across caller code.

use crate::error::{ControlError, Result};
use image::RgbImage;
use parking_lot::Mutex;
use std::io::Cursor;

pub struct ScreenshotCache {
    image: Mutex<RgbImage>,
}

impl ScreenshotCache {
    pub fn new() -> Self {
        Self {
            image: Mutex::new(RgbImage::new(0, 0)),
        }
    }

    /// Replace the cached image.
    pub fn store(&self, image: RgbImage) {
        *self.image.lock() = image;
    }

    /// Deep copy of the cached image. Empty (0x0) before the first
    /// successful screencap.
    pub fn cloned(&self) -> RgbImage {
        self.image.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        let image = self.image.lock();
        image.width() == 0 || image.height() == 0
    }

    /// PNG-encode the cached image under the cache lock.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let image = self.image.lock();
        if image.width() == 0 || image.height() == 0 {
            return Err(ControlError::EmptyScreenshot);
        }
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        Ok(buffer)
    }
}

impl Default for ScreenshotCache {
    fn default() -> Self {
        Self::new()
    }
}
