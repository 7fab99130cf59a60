//! Per-hook outcomes and the events published for them

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::definition::HookConfiguration;
use super::event::{HookContext, HookEventType};

/// Exit code reported when the hook never produced one (launch failure, timeout, cancellation)
pub const ENGINE_ERROR_EXIT_CODE: i32 = -1;

/// Outcome of running one hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// True iff the process completed and exited with code 0
    pub success: bool,
    pub execution_time_ms: u64,
}

impl HookResult {
    /// Result for a process that ran to completion
    pub fn completed(exit_code: i32, stdout: String, stderr: String, elapsed: Duration) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success: exit_code == 0,
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }

    /// Result for a hook that failed before producing an exit code
    pub fn engine_error(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            exit_code: ENGINE_ERROR_EXIT_CODE,
            stdout: String::new(),
            stderr: message.into(),
            success: false,
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Published once per executed hook, whatever the outcome
#[derive(Debug, Clone)]
pub struct HookExecutionEvent {
    pub event_type: HookEventType,
    pub configuration: Arc<HookConfiguration>,
    pub result: HookResult,
    pub context: Arc<HookContext>,
}
