//! Hook event types and the per-invocation context payload

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle points at which hooks can run.
///
/// The set is closed: adding a new point requires a new variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEventType {
    /// Before a prompt is sent to the assistant. Can modify the prompt.
    PrePrompt,
    /// Before context (files, selections) is attached. Can modify the context.
    PreContextAttach,
    /// Before a git commit
    PreCommit,
    /// Before a git push
    PrePush,
    /// Before a git pull
    PrePull,
    /// After the assistant produced a response (read-only)
    PostResponse,
    /// When a workspace is opened (read-only)
    WorkspaceOpen,
    /// Before a file is saved
    FileSave,
}

/// Error returned when parsing an event type name outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook event type '{0}'")]
pub struct UnknownEventType(pub String);

impl HookEventType {
    /// Every event type, in declaration order
    pub const ALL: [HookEventType; 8] = [
        HookEventType::PrePrompt,
        HookEventType::PreContextAttach,
        HookEventType::PreCommit,
        HookEventType::PrePush,
        HookEventType::PrePull,
        HookEventType::PostResponse,
        HookEventType::WorkspaceOpen,
        HookEventType::FileSave,
    ];

    /// Kebab-case name used in workspace hook files (e.g. "pre-commit")
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEventType::PrePrompt => "pre-prompt",
            HookEventType::PreContextAttach => "pre-context-attach",
            HookEventType::PreCommit => "pre-commit",
            HookEventType::PrePush => "pre-push",
            HookEventType::PrePull => "pre-pull",
            HookEventType::PostResponse => "post-response",
            HookEventType::WorkspaceOpen => "workspace-open",
            HookEventType::FileSave => "file-save",
        }
    }

    /// camelCase name used under the `hooks.` settings namespace (e.g. "preCommit")
    pub fn settings_name(&self) -> &'static str {
        match self {
            HookEventType::PrePrompt => "prePrompt",
            HookEventType::PreContextAttach => "preContextAttach",
            HookEventType::PreCommit => "preCommit",
            HookEventType::PrePush => "prePush",
            HookEventType::PrePull => "prePull",
            HookEventType::PostResponse => "postResponse",
            HookEventType::WorkspaceOpen => "workspaceOpen",
            HookEventType::FileSave => "fileSave",
        }
    }

    /// Whether a failing hook should stop the triggering action
    pub fn is_gating(&self) -> bool {
        matches!(
            self,
            HookEventType::PrePrompt
                | HookEventType::PreContextAttach
                | HookEventType::PreCommit
                | HookEventType::PrePush
                | HookEventType::PrePull
                | HookEventType::FileSave
        )
    }

    /// Whether hook output may replace the action's payload
    pub fn is_modifying(&self) -> bool {
        matches!(
            self,
            HookEventType::PrePrompt | HookEventType::PreContextAttach
        )
    }
}

impl fmt::Display for HookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Payload handed to every hook of one `execute` call.
///
/// The shape of `data` belongs to the caller integration; the engine passes it
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookContext {
    pub event_type: HookEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub data: Value,
}

impl HookContext {
    pub fn new(event_type: HookEventType) -> Self {
        Self {
            event_type,
            workspace: None,
            file: None,
            data: Value::Null,
        }
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}
