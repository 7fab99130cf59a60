use anyhow::{Context, Result};
use tracing::info;

use hookwork_core::hooks::{HookContext, HookEventType, HooksWatcher};

use super::{Host, HostArgs};

pub async fn run(host_args: &HostArgs) -> Result<()> {
    let host = Host::open(host_args).await?;

    let _reloads = host.engine.on_reload(|summary| {
        info!(total = summary.total, "Hook configuration reloaded");
        println!("Reloaded: {} hook(s)", summary.total);
        for (event_type, count) in &summary.hooks_per_type {
            println!("  {}: {}", event_type, count);
        }
    });

    let _executions = host.engine.subscribe(|event| {
        info!(
            event = %event.event_type,
            hook = %event.configuration.label(),
            exit_code = event.result.exit_code,
            elapsed_ms = event.result.execution_time_ms,
            "Hook executed"
        );
    });

    let open = HookContext::new(HookEventType::WorkspaceOpen).with_workspace(&host.workspace);
    host.engine.execute(HookEventType::WorkspaceOpen, &open).await?;

    let files = vec![host.settings_path.clone(), host.workspace_file.clone()];
    let _watcher = HooksWatcher::start(host.engine.clone(), files)
        .context("failed to start watching hook configuration")?;

    println!(
        "Watching {} and {} (Ctrl-C to stop)",
        host.settings_path.display(),
        host.workspace_file.display()
    );
    tokio::signal::ctrl_c().await?;
    println!("Stopped.");
    Ok(())
}
