use anyhow::Result;
use clap::Args;

use hookwork_core::hooks::{HookConfiguration, HookEventType};

use super::{Host, HostArgs};

#[derive(Args)]
pub struct ListArgs {
    /// Only list hooks for this event type
    pub event: Option<HookEventType>,
}

pub async fn run(args: ListArgs, host_args: &HostArgs) -> Result<()> {
    let host = Host::open(host_args).await?;

    let event_types: Vec<HookEventType> = match args.event {
        Some(event_type) => vec![event_type],
        None => HookEventType::ALL.to_vec(),
    };

    let mut shown = 0;
    for event_type in event_types {
        let hooks = host.engine.list(event_type);
        if hooks.is_empty() {
            continue;
        }
        println!("{}:", event_type);
        for config in &hooks {
            println!("  {}", describe(config));
        }
        shown += hooks.len();
    }

    if shown == 0 {
        println!("No hooks configured.");
    }
    Ok(())
}

fn describe(config: &HookConfiguration) -> String {
    let mut flags = vec![format!("timeout {}ms", config.timeout_ms())];
    if config.abort_on_failure() {
        flags.push("abort on failure".to_string());
    }
    if config.is_async() {
        flags.push("async".to_string());
    }
    if let Some(dir) = config.working_directory() {
        flags.push(format!("cwd {}", dir.display()));
    }
    if !config.environment().is_empty() {
        flags.push(format!("{} env var(s)", config.environment().len()));
    }
    format!("{} [{}]", config.label(), flags.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_shows_flags() {
        let config = HookConfiguration::command("cargo", ["fmt", "--check"])
            .unwrap()
            .with_timeout_ms(5_000)
            .unwrap()
            .with_abort_on_failure(true)
            .with_env("CI", "1");
        let line = describe(&config);
        assert!(line.contains("timeout 5000ms"));
        assert!(line.contains("abort on failure"));
        assert!(line.contains("1 env var(s)"));
        assert!(!line.contains("async"));
    }
}
