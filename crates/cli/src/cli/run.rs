use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use hookwork_core::hooks::{HookContext, HookDecision, HookEventType, HookResult};

use super::{Host, HostArgs};

#[derive(Args)]
pub struct RunArgs {
    /// Event type to run (e.g. pre-commit, file-save)
    pub event: HookEventType,

    /// File the event is about
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// JSON payload passed to hooks as the context `data`
    #[arg(short, long)]
    pub data: Option<String>,

    /// Output format: text (default) or json
    #[arg(long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: RunArgs, host_args: &HostArgs) -> Result<()> {
    let host = Host::open(host_args).await?;

    let data = match &args.data {
        Some(raw) => serde_json::from_str(raw).context("--data is not valid JSON")?,
        None => serde_json::Value::Null,
    };
    let mut context = HookContext::new(args.event)
        .with_workspace(&host.workspace)
        .with_data(data);
    if let Some(file) = &args.file {
        context = context.with_file(file);
    }

    // Ctrl-C cancels the running hook and skips the rest
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let results = host
        .engine
        .execute_with_cancel(args.event, &context, &cancel)
        .await?;
    let decision = HookDecision::from_results(args.event, &results);

    if args.format.as_str() == "json" {
        let decision_json = match &decision {
            HookDecision::Allow => serde_json::json!({"action": "allow"}),
            HookDecision::Block(reason) => serde_json::json!({"action": "block", "reason": reason}),
            HookDecision::Modify(payload) => {
                serde_json::json!({"action": "modify", "payload": payload})
            }
        };
        let output = serde_json::json!({
            "event": args.event,
            "results": results,
            "decision": decision_json,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_results(args.event, &results);
        match &decision {
            HookDecision::Allow => println!("Decision: allow"),
            HookDecision::Block(reason) => println!("Decision: block ({})", reason),
            HookDecision::Modify(payload) => {
                println!("Decision: modify");
                println!("{}", serde_json::to_string_pretty(payload)?);
            }
        }
    }

    if !decision.is_allowed() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_results(event: HookEventType, results: &[HookResult]) {
    if results.is_empty() {
        println!("No hooks configured for {}", event);
        return;
    }

    for (i, result) in results.iter().enumerate() {
        let status = if result.success { "ok" } else { "FAILED" };
        println!(
            "[{}] {} (exit {}, {}ms)",
            i + 1,
            status,
            result.exit_code,
            result.execution_time_ms
        );
        for line in result.stdout.lines() {
            println!("    {}", line);
        }
        for line in result.stderr.lines() {
            println!("  ! {}", line);
        }
    }
}
