//! Client/device coordinate reconciliation
//!
//! Callers address the screen in a normalised "target" space whose short or
//! long side is pinned by configuration. The mapper derives the full target
//! size lazily from the first real screenshot and converts client
//! coordinates to native device pixels from then on. An app switch may
//! change orientation, so the derived size is invalidated on start/stop.

use crate::error::{ControlError, Result};
use crate::types::Point;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct CoordinateMapper {
    target_long_side: u32,
    target_short_side: u32,
    target_w: u32,
    target_h: u32,
}

impl CoordinateMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the long side of the target space. Clears the short side and
    /// any derived size.
    pub fn set_long_side(&mut self, side: u32) {
        self.target_long_side = side;
        self.target_short_side = 0;
        self.invalidate();
        info!(side, "screenshot target long side set");
    }

    /// Pin the short side of the target space. Clears the long side and
    /// any derived size.
    pub fn set_short_side(&mut self, side: u32) {
        self.target_long_side = 0;
        self.target_short_side = side;
        self.invalidate();
        info!(side, "screenshot target short side set");
    }

    pub fn long_side(&self) -> u32 {
        self.target_long_side
    }

    pub fn short_side(&self) -> u32 {
        self.target_short_side
    }

    /// Derived `(target_w, target_h)`, if calibrated.
    pub fn target_size(&self) -> Option<(u32, u32)> {
        if self.target_w == 0 || self.target_h == 0 {
            None
        } else {
            Some((self.target_w, self.target_h))
        }
    }

    /// Forget the derived target size. The next screenshot re-derives it.
    pub fn invalidate(&mut self) {
        self.target_w = 0;
        self.target_h = 0;
    }

    /// Return the target size, deriving it from the given device image
    /// dimensions on first use.
    pub fn ensure_target_size(&mut self, width: u32, height: u32) -> Result<(u32, u32)> {
        if let Some(size) = self.target_size() {
            return Ok(size);
        }
        if self.target_long_side == 0 && self.target_short_side == 0 {
            return Err(ControlError::Config);
        }

        debug!(
            long_side = self.target_long_side,
            short_side = self.target_short_side,
            width,
            height,
            "deriving target image size"
        );

        let aspect = f64::from(width) / f64::from(height);
        if self.target_short_side != 0 {
            let side = self.target_short_side;
            if width > height {
                self.target_w = (f64::from(side) * aspect).round() as u32;
                self.target_h = side;
            } else {
                self.target_w = side;
                self.target_h = (f64::from(side) / aspect).round() as u32;
            }
        } else {
            let side = self.target_long_side;
            if width > height {
                self.target_w = side;
                self.target_h = (f64::from(side) / aspect).round() as u32;
            } else {
                self.target_w = (f64::from(side) * aspect).round() as u32;
                self.target_h = side;
            }
        }

        info!(
            target_w = self.target_w,
            target_h = self.target_h,
            "target image size derived"
        );
        Ok((self.target_w, self.target_h))
    }

    /// Convert a client-space point to device pixels, given the device's
    /// native resolution.
    pub fn map_to_device(&self, point: Point, res_w: u32, res_h: u32) -> Result<Point> {
        if self.target_w == 0 || self.target_h == 0 {
            return Err(ControlError::Uncalibrated);
        }

        let scale_w = f64::from(res_w) / f64::from(self.target_w);
        let scale_h = f64::from(res_h) / f64::from(self.target_h);

        Ok(Point {
            x: (f64::from(point.x) * scale_w).round() as i32,
            y: (f64::from(point.y) * scale_h).round() as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_side_landscape_derivation() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_short_side(720);
        assert_eq!(mapper.ensure_target_size(1920, 1080).unwrap(), (1280, 720));
    }

    #[test]
    fn test_long_side_landscape_derivation() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_long_side(1280);
        assert_eq!(mapper.ensure_target_size(1920, 1080).unwrap(), (1280, 720));
    }

    #[test]
    fn test_portrait_derivation() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_short_side(720);
        assert_eq!(mapper.ensure_target_size(1080, 1920).unwrap(), (720, 1280));

        let mut mapper = CoordinateMapper::new();
        mapper.set_long_side(1280);
        assert_eq!(mapper.ensure_target_size(1080, 1920).unwrap(), (720, 1280));
    }

    #[test]
    fn test_side_options_are_mutually_exclusive() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_long_side(1280);
        mapper.set_short_side(720);
        assert_eq!(mapper.long_side(), 0);
        assert_eq!(mapper.short_side(), 720);

        mapper.set_long_side(1280);
        assert_eq!(mapper.short_side(), 0);
        assert_eq!(mapper.long_side(), 1280);
    }

    #[test]
    fn test_setting_side_invalidates_derived_size() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_short_side(720);
        mapper.ensure_target_size(1920, 1080).unwrap();
        assert!(mapper.target_size().is_some());

        mapper.set_short_side(540);
        assert!(mapper.target_size().is_none());
    }

    #[test]
    fn test_map_requires_calibration() {
        let mapper = CoordinateMapper::new();
        assert!(matches!(
            mapper.map_to_device(Point::new(1, 1), 1920, 1080),
            Err(ControlError::Uncalibrated)
        ));
    }

    #[test]
    fn test_map_scales_and_rounds() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_short_side(720);
        mapper.ensure_target_size(1920, 1080).unwrap();

        assert_eq!(
            mapper.map_to_device(Point::new(640, 360), 1920, 1080).unwrap(),
            Point::new(960, 540)
        );
        assert_eq!(
            mapper.map_to_device(Point::new(0, 0), 1920, 1080).unwrap(),
            Point::new(0, 0)
        );
        assert_eq!(
            mapper.map_to_device(Point::new(1280, 720), 1920, 1080).unwrap(),
            Point::new(1920, 1080)
        );
    }

    #[test]
    fn test_derivation_without_configured_side_fails() {
        let mut mapper = CoordinateMapper::new();
        assert!(matches!(
            mapper.ensure_target_size(1920, 1080),
            Err(ControlError::Config)
        ));
    }
}
