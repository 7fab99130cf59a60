use anyhow::Result;

use super::{Host, HostArgs};

pub async fn run(host_args: &HostArgs) -> Result<()> {
    let host = Host::open(host_args).await?;

    println!("Workspace:      {}", host.workspace.display());
    println!(
        "Settings:       {}{}",
        host.settings_path.display(),
        missing_marker(&host.settings_path)
    );
    println!(
        "Workspace file: {}{}",
        host.workspace_file.display(),
        missing_marker(&host.workspace_file)
    );

    // Invalid entries were skipped with a warning during load
    let summary = &host.loaded;
    if summary.total == 0 {
        println!("\nNo hooks configured.");
        return Ok(());
    }

    println!();
    for (event_type, count) in &summary.hooks_per_type {
        println!("  {:<20} {}", event_type.to_string(), count);
    }
    println!("  {:<20} {}", "total", summary.total);
    Ok(())
}

fn missing_marker(path: &std::path::Path) -> &'static str {
    if path.exists() { "" } else { " (not found)" }
}
