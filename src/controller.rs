//! Controller core: typed actions, serial dispatch, notifications
//!
//! A [`Controller`] owns a [`DeviceDriver`] and an [`AsyncRunner`] worker.
//! Public `post_*` calls enqueue typed [`Action`]s and return immediately
//! with the job ID; their lifecycle is reported through the notification
//! callback. The blocking helpers post with `block = true` and stay
//! silent. All driver interaction happens on the worker, which also owns
//! every state mutation (screenshot cache, calibration, connected flag).

use crate::coords::CoordinateMapper;
use crate::driver::DeviceDriver;
use crate::error::Result;
use crate::image_cache::ScreenshotCache;
use crate::notify::{msg, NotificationCallback, Notifier};
use crate::runner::{AsyncRunner, Id, Status};
use crate::swipe;
use crate::types::{Point, Rect, SwipeStep};
use image::imageops::{self, FilterType};
use image::RgbImage;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Typed controller options.
#[derive(Debug, Clone)]
pub enum ControllerOption {
    /// Pin the target image long side; clears the short side.
    ScreenshotTargetLongSide(u32),
    /// Pin the target image short side; clears the long side.
    ScreenshotTargetShortSide(u32),
    /// Package (or `package/component`) used by the parameterless
    /// [`Controller::start_app`].
    DefaultAppPackageEntry(String),
    /// Package used by the parameterless [`Controller::stop_app`].
    DefaultAppPackage(String),
}

/// One unit of device work. Coordinates are client-space; the worker maps
/// them to device pixels at dispatch, so calibration problems surface as
/// failed jobs rather than bad posts.
#[derive(Debug, Clone)]
pub enum Action {
    Connect,
    Click { point: Point },
    Swipe { steps: Vec<SwipeStep> },
    PressKey { keycode: i32 },
    Screencap,
    StartApp { package: String },
    StopApp { package: String },
}

struct Core {
    driver: Box<dyn DeviceDriver>,
    notifier: Notifier,
    coords: Mutex<CoordinateMapper>,
    image: ScreenshotCache,
    connected: AtomicBool,
    post_ids: Mutex<HashSet<Id>>,
    default_package_entry: Mutex<String>,
    default_package: Mutex<String>,
}

/// Serial device controller. One worker thread per instance; any number
/// of producer threads.
pub struct Controller {
    runner: AsyncRunner<Action>,
    core: Arc<Core>,
}

impl Controller {
    pub fn new(driver: Box<dyn DeviceDriver>, callback: Option<NotificationCallback>) -> Self {
        let core = Arc::new(Core {
            driver,
            notifier: Notifier::new(callback),
            coords: Mutex::new(CoordinateMapper::new()),
            image: ScreenshotCache::new(),
            connected: AtomicBool::new(false),
            post_ids: Mutex::new(HashSet::new()),
            default_package_entry: Mutex::new(String::new()),
            default_package: Mutex::new(String::new()),
        });

        let runner = AsyncRunner::new({
            let core = Arc::clone(&core);
            move |id, action| core.run_action(id, action)
        });

        Self { runner, core }
    }

    pub fn set_option(&self, option: ControllerOption) {
        info!(?option, "set option");
        match option {
            ControllerOption::ScreenshotTargetLongSide(side) => {
                self.core.coords.lock().set_long_side(side);
            }
            ControllerOption::ScreenshotTargetShortSide(side) => {
                self.core.coords.lock().set_short_side(side);
            }
            ControllerOption::DefaultAppPackageEntry(package) => {
                *self.core.default_package_entry.lock() = package;
            }
            ControllerOption::DefaultAppPackage(package) => {
                *self.core.default_package.lock() = package;
            }
        }
    }

    /// Post a connect job. Notified.
    pub fn post_connection(&self) -> Id {
        self.post_notified(Action::Connect)
    }

    /// Post a click at client coordinates. Notified.
    pub fn post_click(&self, x: i32, y: i32) -> Id {
        self.post_notified(Action::Click {
            point: Point::new(x, y),
        })
    }

    /// Post a swipe along explicit client-space waypoints. Notified.
    pub fn post_swipe(&self, xs: Vec<i32>, ys: Vec<i32>, delays_ms: Vec<u32>) -> Id {
        let steps = xs
            .into_iter()
            .zip(ys)
            .zip(delays_ms)
            .map(|((x, y), delay_ms)| SwipeStep { x, y, delay_ms })
            .collect();
        self.post_notified(Action::Swipe { steps })
    }

    /// Post a screencap job. Notified.
    pub fn post_screencap(&self) -> Id {
        self.post_notified(Action::Screencap)
    }

    // The post_ids lock is held across the post so the worker cannot
    // dispatch the job before its ID is recorded for notification.
    fn post_notified(&self, action: Action) -> Id {
        let mut post_ids = self.core.post_ids.lock();
        let id = self.runner.post(action, false);
        post_ids.insert(id);
        id
    }

    /// Blocking click on a Poisson-sampled point inside `rect`. Silent.
    pub fn click(&self, rect: Rect) {
        self.click_point(swipe::rand_point(rect));
    }

    /// Blocking click at a client-space point. Silent.
    pub fn click_point(&self, point: Point) {
        self.runner.post(Action::Click { point }, true);
    }

    /// Blocking smooth swipe between Poisson-sampled points of the two
    /// rects. Silent.
    pub fn swipe(&self, from: Rect, to: Rect, duration_ms: u32) {
        self.swipe_points(swipe::rand_point(from), swipe::rand_point(to), duration_ms);
    }

    /// Blocking smooth swipe between two client-space points. A zero
    /// duration picks one from the gesture distance. Silent.
    pub fn swipe_points(&self, from: Point, to: Point, duration_ms: u32) {
        let duration_ms = if duration_ms == 0 {
            default_swipe_duration(from, to)
        } else {
            duration_ms
        };
        let steps = swipe::smooth_steps(from, to, duration_ms);
        self.runner.post(Action::Swipe { steps }, true);
    }

    /// Blocking key press. Silent.
    pub fn press_key(&self, keycode: i32) {
        self.runner.post(Action::PressKey { keycode }, true);
    }

    /// Blocking screencap; returns a copy of the refreshed cache (or the
    /// previous image if the capture failed). Silent.
    pub fn screencap(&self) -> RgbImage {
        self.runner.post(Action::Screencap, true);
        self.core.image.cloned()
    }

    /// Blocking app start using the configured default package entry.
    pub fn start_app(&self) {
        let entry = self.core.default_package_entry.lock().clone();
        if entry.is_empty() {
            error!("no default app package entry configured");
            return;
        }
        self.start_app_package(&entry);
    }

    /// Blocking app stop using the configured default package.
    pub fn stop_app(&self) {
        let package = self.core.default_package.lock().clone();
        if package.is_empty() {
            error!("no default app package configured");
            return;
        }
        self.stop_app_package(&package);
    }

    /// Blocking app start. Silent.
    pub fn start_app_package(&self, package: &str) {
        self.runner.post(
            Action::StartApp {
                package: package.to_string(),
            },
            true,
        );
    }

    /// Blocking app stop. Silent.
    pub fn stop_app_package(&self, package: &str) {
        self.runner.post(
            Action::StopApp {
                package: package.to_string(),
            },
            true,
        );
    }

    pub fn status(&self, id: Id) -> Status {
        self.runner.status(id)
    }

    /// Block until `id` completes (or the controller shuts down), then
    /// report its status.
    pub fn wait(&self, id: Id) -> Status {
        self.runner.wait(id);
        self.runner.status(id)
    }

    /// Result of the most recent connect job.
    pub fn connected(&self) -> bool {
        self.core.connected.load(Ordering::SeqCst)
    }

    /// Copy of the cached target-space screenshot.
    pub fn image(&self) -> RgbImage {
        self.core.image.cloned()
    }

    /// PNG bytes of the cached target-space screenshot.
    pub fn image_encoded(&self) -> Result<Vec<u8>> {
        self.core.image.encode_png()
    }

    /// True while jobs are queued or in flight.
    pub fn running(&self) -> bool {
        self.runner.running()
    }

    /// Drop all pending jobs and forget their notification flags.
    pub fn clear(&self) {
        self.runner.clear();
        self.core.post_ids.lock().clear();
    }

    /// Finish the in-flight job, stop the worker, and join it.
    pub fn release(&mut self) {
        self.runner.release();
    }
}

fn default_swipe_duration(from: Point, to: Point) -> u32 {
    let dx = i64::from(to.x - from.x);
    let dy = i64::from(to.y - from.y);
    ((dx * dx + dy * dy) / 1000).clamp(1000, 2000) as u32
}

impl Core {
    fn run_action(&self, id: Id, action: Action) -> bool {
        let notify = self.post_ids.lock().remove(&id);
        let details = json!({ "id": id, "uuid": self.driver.uuid() });

        if notify {
            self.notifier
                .notify(msg::CONTROLLER_ACTION_STARTED, &details);
        }

        let result = match action {
            Action::Connect => self.connect(),
            Action::Click { point } => self.click(point),
            Action::Swipe { steps } => self.swipe(&steps),
            Action::PressKey { keycode } => self.driver.press_key(keycode),
            Action::Screencap => self.screencap(),
            Action::StartApp { package } => self.switch_app(&package, true),
            Action::StopApp { package } => self.switch_app(&package, false),
        };

        let ok = match result {
            Ok(()) => true,
            Err(err) => {
                error!(id, %err, "action failed");
                false
            }
        };

        if notify {
            let code = if ok {
                msg::CONTROLLER_ACTION_COMPLETED
            } else {
                msg::CONTROLLER_ACTION_FAILED
            };
            self.notifier.notify(code, &details);
        }
        ok
    }

    fn connect(&self) -> Result<()> {
        let result = self.driver.connect();
        self.connected.store(result.is_ok(), Ordering::SeqCst);
        result
    }

    fn click(&self, point: Point) -> Result<()> {
        let point = self.map_to_device(point)?;
        self.driver.click(point)
    }

    fn swipe(&self, steps: &[SwipeStep]) -> Result<()> {
        let mapped = steps
            .iter()
            .map(|step| {
                let point = self.map_to_device(Point::new(step.x, step.y))?;
                Ok(SwipeStep {
                    x: point.x,
                    y: point.y,
                    delay_ms: step.delay_ms,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.driver.swipe_steps(&mapped)
    }

    fn map_to_device(&self, point: Point) -> Result<Point> {
        let (res_w, res_h) = self.driver.resolution()?;
        self.coords.lock().map_to_device(point, res_w, res_h)
    }

    fn screencap(&self) -> Result<()> {
        let raw = self.driver.screencap()?;
        self.postproc_screenshot(raw)
    }

    fn postproc_screenshot(&self, raw: RgbImage) -> Result<()> {
        if raw.width() == 0 || raw.height() == 0 {
            return Err(crate::error::ControlError::EmptyScreenshot);
        }

        // Resolution mismatch is logged, not fatal.
        if let Ok((res_w, res_h)) = self.driver.resolution() {
            if raw.dimensions() != (res_w, res_h) {
                warn!(
                    raw_w = raw.width(),
                    raw_h = raw.height(),
                    res_w,
                    res_h,
                    "screenshot size differs from reported resolution"
                );
            }
        }

        let (target_w, target_h) = self
            .coords
            .lock()
            .ensure_target_size(raw.width(), raw.height())?;

        let image = if raw.dimensions() == (target_w, target_h) {
            raw
        } else {
            imageops::resize(&raw, target_w, target_h, FilterType::Triangle)
        };
        if image.width() == 0 || image.height() == 0 {
            return Err(crate::error::ControlError::EmptyScreenshot);
        }

        self.image.store(image);
        Ok(())
    }

    fn switch_app(&self, package: &str, start: bool) -> Result<()> {
        let result = if start {
            self.driver.start_app(package)
        } else {
            self.driver.stop_app(package)
        };
        // Orientation or effective resolution may change with the app.
        self.coords.lock().invalidate();
        result
    }
}
