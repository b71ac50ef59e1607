//! Plug-in action contract
//!
//! Higher layers can register actions that the recogniser/scheduler
//! invokes with the task name, free-form JSON parameters, and the box the
//! recognition stage matched. Implementations run on the caller's thread
//! and should honour `stop` promptly.

use crate::types::Rect;
use serde_json::Value;

pub trait CustomAction: Send + Sync {
    /// Execute the action. `current_box` is the region the preceding
    /// recognition step matched. Returning `false` marks the owning job
    /// failed.
    fn run(&self, task_name: &str, params: &Value, current_box: Rect) -> bool;

    /// Cooperative stop request for a long-running action.
    fn stop(&self);
}
