//! Lifecycle notification dispatch
//!
//! The controller reports job lifecycle transitions through a single
//! user-supplied callback. Calls are made synchronously on the worker
//! thread, so they are serialised with respect to that worker; callbacks
//! that need heavy work should hand it off. A callback must not call back
//! into the same controller with a blocking post, that would deadlock the
//! worker on its own completion cursor.

use serde_json::Value;
use tracing::debug;

/// Message codes delivered to the notification callback.
pub mod msg {
    pub const CONTROLLER_ACTION_STARTED: &str = "Controller_Action_Started";
    pub const CONTROLLER_ACTION_COMPLETED: &str = "Controller_Action_Completed";
    pub const CONTROLLER_ACTION_FAILED: &str = "Controller_Action_Failed";
}

/// Callback receiving `(message_code, details)`. Details always carry at
/// least `id` (integer) and `uuid` (string).
pub type NotificationCallback = Box<dyn Fn(&str, &Value) + Send + Sync>;

/// Stateless facade over an optional [`NotificationCallback`].
pub struct Notifier {
    callback: Option<NotificationCallback>,
}

impl Notifier {
    pub fn new(callback: Option<NotificationCallback>) -> Self {
        Self { callback }
    }

    pub fn notify(&self, code: &str, details: &Value) {
        debug!(code, %details, "notify");
        if let Some(callback) = &self.callback {
            callback(code, details);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_notify_invokes_callback_with_payload() {
        let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::new(Some(Box::new({
            let seen = Arc::clone(&seen);
            move |code, details| seen.lock().push((code.to_string(), details.clone()))
        })));

        notifier.notify(
            msg::CONTROLLER_ACTION_STARTED,
            &json!({ "id": 7, "uuid": "emulator-5554" }),
        );

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, msg::CONTROLLER_ACTION_STARTED);
        assert_eq!(seen[0].1["id"], 7);
        assert_eq!(seen[0].1["uuid"], "emulator-5554");
    }

    #[test]
    fn test_notify_without_callback_is_noop() {
        let notifier = Notifier::new(None);
        notifier.notify(msg::CONTROLLER_ACTION_COMPLETED, &json!({ "id": 1 }));
    }
}
