//! Lifecycle hook system for Hookwork
//!
//! Hooks are external scripts or commands that run at fixed points of the
//! host's lifecycle:
//! - pre-prompt: Before a prompt is sent to the assistant (can modify it)
//! - pre-context-attach: Before context is attached (can modify it)
//! - pre-commit / pre-push / pre-pull: Around git operations (can block)
//! - post-response: After the assistant responded
//! - workspace-open: When a workspace is opened
//! - file-save: Before a file is saved (can block)
//!
//! Hook definitions come from two places, global ones first:
//! - settings: `hooks.<eventType>` (e.g. `hooks.preCommit`)
//! - workspace: `.vscode/hooks.json`
//!
//! Example workspace file:
//! ```json
//! {
//!   "hooks": {
//!     "pre-commit": [
//!       { "script": "./scripts/lint.sh", "timeout": 10000, "abortOnFailure": true }
//!     ],
//!     "pre-context-attach": { "command": "python3", "args": ["filter-context.py"] }
//!   }
//! }
//! ```
//!
//! The hook context JSON is piped to stdin and exported as `HOOK_CONTEXT`;
//! scripts also receive it as their last argument. Exit code 0 = success.

mod bus;
mod decision;
mod definition;
mod engine;
mod event;
mod loader;
mod registry;
mod result;
mod runner;
mod watch;

pub use bus::{EventBus, Subscription};
pub use decision::HookDecision;
pub use definition::{DEFAULT_TIMEOUT_MS, HookAction, HookConfigError, HookConfiguration, RawHookConfig};
pub use engine::{HookEngine, HookEngineError, ReloadSummary};
pub use event::{HookContext, HookEventType, UnknownEventType};
pub use loader::{
    ConfigLoader, FileReader, FsFileReader, ReadError, SETTINGS_NAMESPACE, SettingsSource,
    WORKSPACE_HOOKS_FILE, parse_workspace_document,
};
pub use registry::{HookMap, HookRegistration, HookRegistry};
pub use result::{ENGINE_ERROR_EXIT_CODE, HookExecutionEvent, HookResult};
pub use runner::{
    HOOK_CONTEXT_ENV, HOOK_EVENT_TYPE_ENV, HOOK_FILE_ENV, HOOK_WORKSPACE_ENV, HookInvocation,
    HookProgram, ProcessOutput, ProcessRunner, RunnerError, ShellRunner, TIMESTAMP_ENV,
};
pub use watch::HooksWatcher;
