//! Process runner: launches hook scripts and commands
//!
//! The engine only talks to the [`ProcessRunner`] trait. [`ShellRunner`] is the
//! default implementation on top of `tokio::process`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::event::HookEventType;

/// Environment variable carrying the serialized hook context
pub const HOOK_CONTEXT_ENV: &str = "HOOK_CONTEXT";
/// Environment variable carrying the kebab-case event type
pub const HOOK_EVENT_TYPE_ENV: &str = "HOOK_EVENT_TYPE";
/// Environment variable carrying the workspace path, when known
pub const HOOK_WORKSPACE_ENV: &str = "HOOK_WORKSPACE";
/// Environment variable carrying the file path, when known
pub const HOOK_FILE_ENV: &str = "HOOK_FILE";
/// RFC 3339 timestamp of the invocation
pub const TIMESTAMP_ENV: &str = "TIMESTAMP";

/// What to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookProgram {
    Script(PathBuf),
    Command { command: String, args: Vec<String> },
}

/// Everything the runner needs to launch one hook
#[derive(Debug, Clone)]
pub struct HookInvocation {
    pub event_type: HookEventType,
    pub program: HookProgram,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub timeout: Duration,
    /// Full hook context as JSON
    pub context_json: String,
    pub workspace: Option<PathBuf>,
    pub file: Option<PathBuf>,
}

/// Raw output of a process that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("hook timed out after {0}ms")]
    Timeout(u64),
    #[error("hook was cancelled")]
    Cancelled,
    #[error("hook wait failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run one hook to completion.
    ///
    /// Implementations must not leave the process running past
    /// `invocation.timeout` or after `cancel` fires.
    async fn run(
        &self,
        invocation: &HookInvocation,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, RunnerError>;
}

/// Runs hooks as child processes.
///
/// - Scripts run directly with the context JSON as their last argument.
/// - Commands without args go through `sh -c` (`cmd /C` on Windows).
/// - Commands with args run the program directly.
///
/// The context JSON is always piped to stdin and exported as `HOOK_CONTEXT`.
///
/// On unix each hook runs in its own process group. The group is killed on
/// timeout, on cancellation and once the hook exits, so background processes
/// never outlive the hook.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(invocation: &HookInvocation) -> (String, Command) {
        let (label, mut cmd) = match &invocation.program {
            HookProgram::Script(path) => {
                let mut cmd = Command::new(path);
                cmd.arg(&invocation.context_json);
                (path.display().to_string(), cmd)
            }
            HookProgram::Command { command, args } if args.is_empty() => {
                (command.clone(), shell_command(command))
            }
            HookProgram::Command { command, args } => {
                let mut cmd = Command::new(command);
                cmd.args(args);
                (command.clone(), cmd)
            }
        };

        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }
        cmd.env(HOOK_CONTEXT_ENV, &invocation.context_json)
            .env(HOOK_EVENT_TYPE_ENV, invocation.event_type.as_str())
            .env(TIMESTAMP_ENV, chrono::Utc::now().to_rfc3339());
        if let Some(workspace) = &invocation.workspace {
            cmd.env(HOOK_WORKSPACE_ENV, workspace);
        }
        if let Some(file) = &invocation.file {
            cmd.env(HOOK_FILE_ENV, file);
        }
        cmd.envs(&invocation.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so timeouts can take down everything the hook spawned
        #[cfg(unix)]
        cmd.process_group(0);

        (label, cmd)
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(
        &self,
        invocation: &HookInvocation,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, RunnerError> {
        let start = Instant::now();
        let (program, mut cmd) = Self::build_command(invocation);

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;
        // Also the process group id on unix; unavailable once the child is reaped
        let pid = child.id();

        // Feed stdin concurrently so a hook that writes a lot before reading
        // cannot deadlock against us.
        if let Some(mut stdin) = child.stdin.take() {
            let payload = invocation.context_json.clone().into_bytes();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!("Hook did not consume stdin: {}", e);
                }
            });
        }
        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        // Wait for the hook process itself, not for its pipes: a background
        // child may keep stdout open long after the hook exited.
        let status = tokio::select! {
            result = timeout(invocation.timeout, child.wait()) => match result {
                Ok(status) => status?,
                Err(_) => {
                    kill_process_group(pid);
                    return Err(RunnerError::Timeout(invocation.timeout.as_millis() as u64));
                }
            },
            _ = cancel.cancelled() => {
                kill_process_group(pid);
                return Err(RunnerError::Cancelled);
            }
        };

        // Nothing the hook started may outlive it
        kill_process_group(pid);

        let exit_code = status.code().unwrap_or(-1);
        debug!("Hook '{}' exited with code {}", program, exit_code);

        Ok(ProcessOutput {
            exit_code,
            stdout: collect_output(stdout).await,
            stderr: collect_output(stderr).await,
            elapsed: start.elapsed(),
        })
    }
}

/// How long to keep reading output after the hook process exited
const PIPE_GRACE: Duration = Duration::from_millis(100);

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe
        && let Err(e) = pipe.read_to_end(&mut buf).await
    {
        debug!("Failed to read hook output: {}", e);
    }
    buf
}

async fn collect_output(mut task: JoinHandle<Vec<u8>>) -> String {
    match timeout(PIPE_GRACE, &mut task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => {
            debug!("Hook output reader failed: {}", e);
            String::new()
        }
        Err(_) => {
            debug!("Hook output still open after exit, discarding it");
            task.abort();
            String::new()
        }
    }
}

/// SIGKILL the hook's process group, taking any background children with it
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!("Failed to kill hook process group {}: {}", pid, e),
    }
}

// kill_on_drop covers the direct child
#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
