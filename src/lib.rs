//! droidpilot: asynchronous controller for ADB-driven device automation
//!
//! This library provides the action-runner core of a phone automation
//! stack:
//! - A generic single-consumer job queue with process-wide monotonic IDs,
//!   per-job status, and blocking-or-async posting (`runner`)
//! - A controller that turns typed device actions into serially executed
//!   jobs with lifecycle notifications (`controller`)
//! - Client/device coordinate reconciliation against a normalised target
//!   image space (`coords`)
//! - Human-like swipe synthesis (`swipe`)
//! - An ADB backend implementing the device driver seam (`adb`)
//!
//! # Example
//!
//! ```no_run
//! use droidpilot::{AdbConfig, AdbDriver, Controller, ControllerOption, Status};
//!
//! fn main() -> droidpilot::Result<()> {
//!     let driver = AdbDriver::new(AdbConfig::new().with_address("192.168.1.20"))?;
//!     let controller = Controller::new(Box::new(driver), None);
//!     controller.set_option(ControllerOption::ScreenshotTargetShortSide(720));
//!
//!     let id = controller.post_connection();
//!     assert_eq!(controller.wait(id), Status::Success);
//!
//!     let shot = controller.post_screencap();
//!     controller.wait(shot);
//!     let png = controller.image_encoded()?;
//!     println!("captured {} bytes", png.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;
pub mod types;

// Scheduling and notification
pub mod notify;
pub mod runner;

// Device-space reconciliation and gestures
pub mod coords;
pub mod swipe;

// Controller and its collaborators
pub mod controller;
pub mod custom;
pub mod driver;
pub mod image_cache;

// ADB backend
pub mod adb;
pub mod config;

// Re-export commonly used types and functions
pub use error::{ControlError, Result};
pub use types::{Point, Rect, SwipeStep};

pub use notify::{msg, NotificationCallback, Notifier};
pub use runner::{AsyncRunner, Id, Status, INVALID_ID};

pub use controller::{Action, Controller, ControllerOption};
pub use coords::CoordinateMapper;
pub use custom::CustomAction;
pub use driver::DeviceDriver;
pub use image_cache::ScreenshotCache;

pub use adb::{AdbConnection, AdbDriver};
pub use config::{AdbConfig, AdbTimingConfig};
