//! Turning hook results into a proceed/abort/modify decision for callers

use serde_json::Value;

use super::event::HookEventType;
use super::result::HookResult;

/// Decision a caller integration derives from the results of one `execute` call
#[derive(Debug, Clone, PartialEq)]
pub enum HookDecision {
    /// Proceed with the original payload
    Allow,
    /// Stop the triggering action
    Block(String),
    /// Proceed with the payload produced by a hook
    Modify(Value),
}

impl HookDecision {
    /// Interpret results the way the built-in integrations do.
    ///
    /// - Gating event types block on the first failed hook.
    /// - Modifying event types take the last successful non-empty stdout as
    ///   the new payload: parsed JSON when possible, the trimmed text otherwise.
    /// - Everything else is allowed.
    pub fn from_results(event_type: HookEventType, results: &[HookResult]) -> Self {
        if event_type.is_gating()
            && let Some(failed) = results.iter().find(|r| !r.success)
        {
            let stderr = failed.stderr.trim();
            let reason = if stderr.is_empty() {
                format!("{} hook exited with code {}", event_type, failed.exit_code)
            } else {
                stderr.to_string()
            };
            return HookDecision::Block(reason);
        }

        if event_type.is_modifying()
            && let Some(output) = results
                .iter()
                .rev()
                .filter(|r| r.success)
                .map(|r| r.stdout.trim())
                .find(|stdout| !stdout.is_empty())
        {
            let payload = serde_json::from_str(output)
                .unwrap_or_else(|_| Value::String(output.to_string()));
            return HookDecision::Modify(payload);
        }

        HookDecision::Allow
    }

    /// Check if this decision allows the operation
    pub fn is_allowed(&self) -> bool {
        !matches!(self, HookDecision::Block(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn ok(stdout: &str) -> HookResult {
        HookResult::completed(0, stdout.to_string(), String::new(), Duration::ZERO)
    }

    fn failed(code: i32, stderr: &str) -> HookResult {
        HookResult::completed(code, String::new(), stderr.to_string(), Duration::ZERO)
    }

    #[test]
    fn test_no_results_allow() {
        assert_eq!(
            HookDecision::from_results(HookEventType::PreCommit, &[]),
            HookDecision::Allow
        );
    }

    #[test]
    fn test_gating_failure_blocks() {
        let decision = HookDecision::from_results(
            HookEventType::PreCommit,
            &[ok(""), failed(1, "lint failed\n"), failed(2, "other")],
        );
        assert_eq!(decision, HookDecision::Block("lint failed".to_string()));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_block_reason_falls_back_to_exit_code() {
        let decision = HookDecision::from_results(HookEventType::PrePush, &[failed(7, "")]);
        assert_eq!(
            decision,
            HookDecision::Block("pre-push hook exited with code 7".to_string())
        );
    }

    #[test]
    fn test_read_only_events_never_block() {
        let decision =
            HookDecision::from_results(HookEventType::PostResponse, &[failed(1, "boom")]);
        assert_eq!(decision, HookDecision::Allow);
    }

    #[test]
    fn test_modifying_event_takes_last_json_output() {
        let decision = HookDecision::from_results(
            HookEventType::PreContextAttach,
            &[
                ok(r#"{"prompt":"first"}"#),
                ok("{\n  \"prompt\": \"[REDACTED_TOKEN]\"\n}\n"),
                ok(""),
            ],
        );
        assert_eq!(
            decision,
            HookDecision::Modify(json!({"prompt": "[REDACTED_TOKEN]"}))
        );
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_modifying_event_plain_text_output() {
        let decision =
            HookDecision::from_results(HookEventType::PrePrompt, &[ok("rewritten prompt\n")]);
        assert_eq!(decision, HookDecision::Modify(json!("rewritten prompt")));
    }

    #[test]
    fn test_stdout_ignored_for_non_modifying_events() {
        let decision = HookDecision::from_results(HookEventType::FileSave, &[ok("{\"a\":1}")]);
        assert_eq!(decision, HookDecision::Allow);
    }
}
