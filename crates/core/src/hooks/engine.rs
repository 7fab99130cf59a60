//! Hook execution engine

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::bus::{EventBus, Subscription};
use super::definition::{HookAction, HookConfiguration};
use super::event::{HookContext, HookEventType};
use super::loader::ConfigLoader;
use super::registry::{HookRegistration, HookRegistry};
use super::result::{HookExecutionEvent, HookResult};
use super::runner::{HookInvocation, HookProgram, ProcessRunner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookEngineError {
    #[error("context is for {context} but execution was requested for {requested}")]
    ContextMismatch {
        requested: HookEventType,
        context: HookEventType,
    },
}

/// Published after every reload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub hooks_per_type: BTreeMap<HookEventType, usize>,
    pub total: usize,
}

/// Owns the hook registry and runs hooks for one host session.
///
/// Hooks for an event type run strictly one after another in registration
/// order. A failing hook marked `abortOnFailure` stops the chain; every other
/// failure is recorded and execution continues.
pub struct HookEngine {
    registry: HookRegistry,
    loader: ConfigLoader,
    runner: Arc<dyn ProcessRunner>,
    executions: EventBus<HookExecutionEvent>,
    reloads: EventBus<ReloadSummary>,
}

impl HookEngine {
    /// Create an engine with an empty registry. Call [`HookEngine::reload`] to load configuration.
    pub fn new(loader: ConfigLoader, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            registry: HookRegistry::new(),
            loader,
            runner,
            executions: EventBus::new(),
            reloads: EventBus::new(),
        }
    }

    /// Register a hook programmatically.
    ///
    /// Programmatic registrations are discarded by the next reload; owners
    /// that need them to persist re-register from an [`HookEngine::on_reload`]
    /// callback.
    pub fn register(&self, event_type: HookEventType, config: HookConfiguration) -> HookRegistration {
        self.registry.register(event_type, config)
    }

    pub fn list(&self, event_type: HookEventType) -> Vec<Arc<HookConfiguration>> {
        self.registry.list(event_type)
    }

    pub fn has(&self, event_type: HookEventType) -> bool {
        self.registry.has(event_type)
    }

    pub fn clear(&self, event_type: HookEventType) {
        self.registry.clear(event_type);
    }

    /// Whether a caller should wait for hooks of this type before proceeding.
    ///
    /// False only when hooks exist and all of them are marked `async`.
    pub fn requires_await(&self, event_type: HookEventType) -> bool {
        self.registry
            .list(event_type)
            .iter()
            .any(|config| !config.is_async())
    }

    /// Replace the whole registry with freshly loaded configuration
    pub async fn reload(&self) -> ReloadSummary {
        let hooks = self.loader.load().await;

        let hooks_per_type: BTreeMap<_, _> = hooks
            .iter()
            .map(|(event_type, list)| (*event_type, list.len()))
            .collect();
        let summary = ReloadSummary {
            total: hooks_per_type.values().sum(),
            hooks_per_type,
        };

        self.registry.replace_all(hooks);
        info!("Loaded {} hook(s)", summary.total);

        self.reloads.publish(&summary);
        summary
    }

    /// Subscribe to per-hook execution events
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&HookExecutionEvent) + Send + Sync + 'static,
    {
        self.executions.subscribe(callback)
    }

    /// Subscribe to reload completions
    pub fn on_reload<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ReloadSummary) + Send + Sync + 'static,
    {
        self.reloads.subscribe(callback)
    }

    /// Run every hook registered for `event_type`
    pub async fn execute(
        &self,
        event_type: HookEventType,
        context: &HookContext,
    ) -> Result<Vec<HookResult>, HookEngineError> {
        self.execute_with_cancel(event_type, context, &CancellationToken::new())
            .await
    }

    /// Run every hook registered for `event_type`, stopping early if `cancel` fires.
    ///
    /// A hook in flight when `cancel` fires yields a failed result; hooks not
    /// yet started are never started.
    pub async fn execute_with_cancel(
        &self,
        event_type: HookEventType,
        context: &HookContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<HookResult>, HookEngineError> {
        if context.event_type != event_type {
            return Err(HookEngineError::ContextMismatch {
                requested: event_type,
                context: context.event_type,
            });
        }

        let hooks = self.registry.list(event_type);
        if hooks.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Running {} hook(s) for {}", hooks.len(), event_type);

        let context = Arc::new(context.clone());
        let context_json = match serde_json::to_string(context.as_ref()) {
            Ok(json) => json,
            Err(e) => {
                // Only reachable with a non-string map key in `data`
                warn!("Failed to serialize context for {}: {}", event_type, e);
                "{}".to_string()
            }
        };

        let mut results = Vec::with_capacity(hooks.len());
        for config in hooks {
            if cancel.is_cancelled() {
                debug!("Hooks for {} cancelled, skipping the rest", event_type);
                break;
            }

            let invocation = build_invocation(event_type, &config, &context, &context_json);
            let start = Instant::now();
            let result = match self.runner.run(&invocation, cancel).await {
                Ok(output) => HookResult::completed(
                    output.exit_code,
                    output.stdout,
                    output.stderr,
                    output.elapsed,
                ),
                Err(e) => HookResult::engine_error(e.to_string(), start.elapsed()),
            };

            if result.success {
                debug!("Hook '{}' succeeded in {}ms", config.label(), result.execution_time_ms);
            } else {
                warn!(
                    "Hook '{}' for {} failed (exit code {}): {}",
                    config.label(),
                    event_type,
                    result.exit_code,
                    result.stderr.trim()
                );
            }

            let abort = !result.success && config.abort_on_failure();
            results.push(result.clone());
            self.executions.publish(&HookExecutionEvent {
                event_type,
                configuration: Arc::clone(&config),
                result,
                context: Arc::clone(&context),
            });

            if abort {
                debug!("Hook '{}' aborted the {} chain", config.label(), event_type);
                break;
            }
        }

        Ok(results)
    }
}

/// Translate a configuration into a runner invocation.
///
/// Relative script paths and working directories resolve against the workspace;
/// the working directory defaults to the workspace itself.
fn build_invocation(
    event_type: HookEventType,
    config: &HookConfiguration,
    context: &HookContext,
    context_json: &str,
) -> HookInvocation {
    let workspace = context.workspace.as_deref();

    let program = match config.action() {
        HookAction::Script { path } => HookProgram::Script(resolve(workspace, path)),
        HookAction::Command { command, args } => HookProgram::Command {
            command: command.clone(),
            args: args.clone(),
        },
    };
    let cwd = match config.working_directory() {
        Some(dir) => Some(resolve(workspace, dir)),
        None => workspace.map(Path::to_path_buf),
    };

    HookInvocation {
        event_type,
        program,
        cwd,
        env: config.environment().clone(),
        timeout: config.timeout(),
        context_json: context_json.to_string(),
        workspace: context.workspace.clone(),
        file: context.file.clone(),
    }
}

fn resolve(workspace: Option<&Path>, path: &Path) -> PathBuf {
    match workspace {
        Some(ws) if path.is_relative() => ws.join(path),
        _ => path.to_path_buf(),
    }
}
