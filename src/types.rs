//! Geometry primitives shared between the controller and device backends

use serde::{Deserialize, Serialize};

/// A point in screen coordinates.
///
/// Whether the coordinates are client-space (target image) or device-space
/// (native pixels) depends on where the value sits in the pipeline; the
/// controller maps client points to device points before they reach a
/// driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2,
            y: self.y + self.height / 2,
        }
    }
}

/// One waypoint of a swipe gesture: position plus the dwell before the
/// next waypoint is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeStep {
    pub x: i32,
    pub y: i32,
    pub delay_ms: u32,
}
