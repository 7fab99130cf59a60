//! Hook configuration values and their declarative JSON form

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timeout applied when a configuration does not set one
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookConfigError {
    #[error("hook must set exactly one of 'script' or 'command', found neither")]
    MissingAction,
    #[error("hook must set exactly one of 'script' or 'command', found both")]
    AmbiguousAction,
    #[error("'args' is only valid together with 'command'")]
    ArgsWithoutCommand,
    #[error("hook {0} must not be empty")]
    EmptyField(&'static str),
    #[error("hook timeout must be a positive number of milliseconds")]
    ZeroTimeout,
    #[error("invalid hook configuration: {0}")]
    Malformed(String),
}

/// What a hook runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Path to an executable script. Receives the context JSON as its last argument.
    Script { path: PathBuf },
    /// Command line. Without args it is interpreted by the platform shell.
    Command { command: String, args: Vec<String> },
}

/// One configured hook.
///
/// Immutable once built. Registered instances are shared as
/// `Arc<HookConfiguration>` and compared by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfiguration {
    action: HookAction,
    timeout_ms: u64,
    abort_on_failure: bool,
    run_async: bool,
    working_directory: Option<PathBuf>,
    environment: HashMap<String, String>,
}

impl HookConfiguration {
    /// Hook that runs the script at `path`
    pub fn script(path: impl Into<PathBuf>) -> Result<Self, HookConfigError> {
        Self::from_action(HookAction::Script { path: path.into() })
    }

    /// Hook that runs `command` with `args`
    pub fn command<I, S>(command: impl Into<String>, args: I) -> Result<Self, HookConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_action(HookAction::Command {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    fn from_action(action: HookAction) -> Result<Self, HookConfigError> {
        match &action {
            HookAction::Script { path } if path.as_os_str().is_empty() => {
                return Err(HookConfigError::EmptyField("script"));
            }
            HookAction::Command { command, .. } if command.trim().is_empty() => {
                return Err(HookConfigError::EmptyField("command"));
            }
            _ => {}
        }
        Ok(Self {
            action,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            abort_on_failure: false,
            run_async: false,
            working_directory: None,
            environment: HashMap::new(),
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, HookConfigError> {
        if timeout_ms == 0 {
            return Err(HookConfigError::ZeroTimeout);
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn with_abort_on_failure(mut self, abort_on_failure: bool) -> Self {
        self.abort_on_failure = abort_on_failure;
        self
    }

    pub fn with_async(mut self, run_async: bool) -> Self {
        self.run_async = run_async;
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn action(&self) -> &HookAction {
        &self.action
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn abort_on_failure(&self) -> bool {
        self.abort_on_failure
    }

    /// Advisory flag for caller integrations; the engine always awaits hooks
    pub fn is_async(&self) -> bool {
        self.run_async
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    /// Short human-readable label used in logs
    pub fn label(&self) -> String {
        match &self.action {
            HookAction::Script { path } => path.display().to_string(),
            HookAction::Command { command, args } if args.is_empty() => command.clone(),
            HookAction::Command { command, args } => format!("{} {}", command, args.join(" ")),
        }
    }
}

/// Declarative hook entry as written in settings and workspace hook files:
/// `{script?, command?, args?, timeout?, abortOnFailure?, async?, cwd?, env?}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Timeout in milliseconds (default: 5000)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub abort_on_failure: bool,
    #[serde(default, rename = "async")]
    pub run_async: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl RawHookConfig {
    /// Parse one declarative entry from a JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, HookConfigError> {
        serde_json::from_value(value).map_err(|e| HookConfigError::Malformed(e.to_string()))
    }
}

impl TryFrom<RawHookConfig> for HookConfiguration {
    type Error = HookConfigError;

    fn try_from(raw: RawHookConfig) -> Result<Self, Self::Error> {
        let action = match (raw.script, raw.command) {
            (Some(_), Some(_)) => return Err(HookConfigError::AmbiguousAction),
            (None, None) => return Err(HookConfigError::MissingAction),
            (Some(path), None) => {
                if raw.args.as_ref().is_some_and(|a| !a.is_empty()) {
                    return Err(HookConfigError::ArgsWithoutCommand);
                }
                HookAction::Script { path }
            }
            (None, Some(command)) => HookAction::Command {
                command,
                args: raw.args.unwrap_or_default(),
            },
        };

        let mut config = HookConfiguration::from_action(action)?
            .with_timeout_ms(raw.timeout.unwrap_or(DEFAULT_TIMEOUT_MS))?
            .with_abort_on_failure(raw.abort_on_failure)
            .with_async(raw.run_async);
        config.working_directory = raw.cwd;
        config.environment = raw.env;
        Ok(config)
    }
}

impl From<&HookConfiguration> for RawHookConfig {
    fn from(config: &HookConfiguration) -> Self {
        let (script, command, args) = match &config.action {
            HookAction::Script { path } => (Some(path.clone()), None, None),
            HookAction::Command { command, args } => (
                None,
                Some(command.clone()),
                (!args.is_empty()).then(|| args.clone()),
            ),
        };
        Self {
            script,
            command,
            args,
            timeout: Some(config.timeout_ms),
            abort_on_failure: config.abort_on_failure,
            run_async: config.run_async,
            cwd: config.working_directory.clone(),
            env: config.environment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<HookConfiguration, HookConfigError> {
        HookConfiguration::try_from(RawHookConfig::from_value(value)?)
    }

    #[test]
    fn test_script_with_options() {
        let config = parse(json!({
            "script": "./a.sh",
            "timeout": 1000,
            "abortOnFailure": true
        }))
        .unwrap();

        assert_eq!(
            config.action(),
            &HookAction::Script {
                path: PathBuf::from("./a.sh")
            }
        );
        assert_eq!(config.timeout_ms(), 1000);
        assert!(config.abort_on_failure());
        assert!(!config.is_async());
    }

    #[test]
    fn test_default_values() {
        let config = parse(json!({"command": "true"})).unwrap();
        assert_eq!(config.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert!(!config.abort_on_failure());
        assert!(!config.is_async());
        assert!(config.working_directory().is_none());
        assert!(config.environment().is_empty());
    }

    #[test]
    fn test_command_with_args_env_and_cwd() {
        let config = parse(json!({
            "command": "npm",
            "args": ["run", "lint"],
            "async": true,
            "cwd": "frontend",
            "env": {"CI": "1"}
        }))
        .unwrap();

        assert_eq!(
            config.action(),
            &HookAction::Command {
                command: "npm".to_string(),
                args: vec!["run".to_string(), "lint".to_string()],
            }
        );
        assert!(config.is_async());
        assert_eq!(config.working_directory(), Some(Path::new("frontend")));
        assert_eq!(config.environment().get("CI").map(String::as_str), Some("1"));
        assert_eq!(config.label(), "npm run lint");
    }

    #[test]
    fn test_rejects_both_and_neither() {
        assert_eq!(
            parse(json!({"script": "a.sh", "command": "echo"})),
            Err(HookConfigError::AmbiguousAction)
        );
        assert_eq!(
            parse(json!({"timeout": 10})),
            Err(HookConfigError::MissingAction)
        );
    }

    #[test]
    fn test_rejects_zero_timeout_and_stray_args() {
        assert_eq!(
            parse(json!({"command": "echo", "timeout": 0})),
            Err(HookConfigError::ZeroTimeout)
        );
        assert_eq!(
            parse(json!({"script": "a.sh", "args": ["x"]})),
            Err(HookConfigError::ArgsWithoutCommand)
        );
        assert_eq!(
            parse(json!({"command": "  "})),
            Err(HookConfigError::EmptyField("command"))
        );
    }

    #[test]
    fn test_rejects_wrong_field_types() {
        let err = parse(json!({"command": "echo", "timeout": "fast"})).unwrap_err();
        assert!(matches!(err, HookConfigError::Malformed(_)));
    }

    #[test]
    fn test_constructors_reject_empty_action() {
        assert_eq!(
            HookConfiguration::script(""),
            Err(HookConfigError::EmptyField("script"))
        );
        assert_eq!(
            HookConfiguration::command("  ", Vec::<String>::new()),
            Err(HookConfigError::EmptyField("command"))
        );
        assert!(HookConfiguration::command("true", Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let err = HookConfiguration::command("echo", ["a"])
            .unwrap()
            .with_timeout_ms(0)
            .unwrap_err();
        assert_eq!(err, HookConfigError::ZeroTimeout);
    }

    #[test]
    fn test_raw_form_mirrors_configuration() {
        let config = HookConfiguration::script("./check.sh")
            .unwrap()
            .with_timeout_ms(250)
            .unwrap()
            .with_abort_on_failure(true);
        let raw = RawHookConfig::from(&config);

        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            json!({
                "script": "./check.sh",
                "timeout": 250,
                "abortOnFailure": true,
                "async": false
            })
        );
    }
}
