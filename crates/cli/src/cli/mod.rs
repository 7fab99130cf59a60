pub mod check;
pub mod list;
pub mod run;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use hookwork_core::config::{Settings, SettingsFile, expand_path};
use hookwork_core::env::{HOOKWORK_SETTINGS, HOOKWORK_WORKSPACE};
use hookwork_core::hooks::{
    ConfigLoader, FsFileReader, HookEngine, ReloadSummary, ShellRunner,
};

#[derive(Parser)]
#[command(name = "hookwork")]
#[command(author, version, about = "Run user-configured hooks at lifecycle points", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub host: HostArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where hook configuration comes from
#[derive(Args, Clone)]
pub struct HostArgs {
    /// Workspace root (defaults to the current directory)
    #[arg(short, long, global = true, env = HOOKWORK_WORKSPACE)]
    pub workspace: Option<PathBuf>,

    /// Settings file holding global hooks
    #[arg(short, long, global = true, env = HOOKWORK_SETTINGS)]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the hooks for one event type
    Run(run::RunArgs),

    /// List configured hooks
    List(list::ListArgs),

    /// Load configuration and report what was found
    Check,

    /// Reload hooks whenever their configuration changes
    Watch,
}

/// Host session: an engine loaded from the configured sources
pub struct Host {
    pub engine: Arc<HookEngine>,
    pub workspace: PathBuf,
    pub settings_path: PathBuf,
    pub workspace_file: PathBuf,
    /// Result of the initial load
    pub loaded: ReloadSummary,
}

impl Host {
    pub async fn open(args: &HostArgs) -> Result<Self> {
        let workspace = match &args.workspace {
            Some(path) => expand_path(path)?,
            None => std::env::current_dir()?,
        };

        let settings_path = match &args.settings {
            Some(path) => expand_path(path)?,
            None => Settings::default_path()?,
        };
        let loader = ConfigLoader::new(
            Arc::new(SettingsFile::new(&settings_path)),
            Arc::new(FsFileReader),
            Some(workspace.clone()),
        );
        let workspace_file = loader
            .workspace_file()
            .context("no workspace hooks file for the workspace")?;
        let engine = Arc::new(HookEngine::new(loader, Arc::new(ShellRunner::new())));
        let loaded = engine.reload().await;

        Ok(Self {
            engine,
            workspace,
            settings_path,
            workspace_file,
            loaded,
        })
    }
}
