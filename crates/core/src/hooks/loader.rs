//! Hook configuration loading from settings and the workspace hooks file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::definition::{HookConfiguration, RawHookConfig};
use super::event::HookEventType;
use super::registry::HookMap;

/// Workspace hooks file, relative to the workspace root
pub const WORKSPACE_HOOKS_FILE: &str = ".vscode/hooks.json";

/// Settings namespace holding the global hook lists (`hooks.preCommit`, ...)
pub const SETTINGS_NAMESPACE: &str = "hooks";

/// Read-only access to host settings
#[cfg_attr(test, mockall::automock)]
pub trait SettingsSource: Send + Sync {
    /// Value stored under a dotted key such as `hooks.preCommit`
    fn get_value(&self, key: &str) -> Option<Value>;
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Text file access used for the workspace hooks file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read_text(&self, path: &Path) -> Result<String, ReadError>;
}

/// [`FileReader`] backed by the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsFileReader;

#[async_trait]
impl FileReader for FsFileReader {
    async fn read_text(&self, path: &Path) -> Result<String, ReadError> {
        tokio::fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ReadError::NotFound(path.to_path_buf())
            } else {
                ReadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }
}

/// Builds the full hook mapping from global settings and the workspace file.
///
/// Global entries for an event type run before workspace entries. Problems in
/// either source never fail the load: the offending entry, key, or file is
/// skipped with a log message.
#[derive(Clone)]
pub struct ConfigLoader {
    settings: Arc<dyn SettingsSource>,
    reader: Arc<dyn FileReader>,
    workspace: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        reader: Arc<dyn FileReader>,
        workspace: Option<PathBuf>,
    ) -> Self {
        Self {
            settings,
            reader,
            workspace,
        }
    }

    /// Location of the workspace hooks file, if a workspace is set
    pub fn workspace_file(&self) -> Option<PathBuf> {
        self.workspace.as_ref().map(|ws| ws.join(WORKSPACE_HOOKS_FILE))
    }

    pub async fn load(&self) -> HookMap {
        let mut hooks = self.load_settings();

        for (event_type, list) in self.load_workspace_file().await {
            hooks.entry(event_type).or_default().extend(list);
        }

        hooks.retain(|_, list| !list.is_empty());
        hooks
    }

    fn load_settings(&self) -> HookMap {
        let mut hooks = HookMap::new();
        for event_type in HookEventType::ALL {
            let key = format!("{}.{}", SETTINGS_NAMESPACE, event_type.settings_name());
            if let Some(value) = self.settings.get_value(&key) {
                let list = parse_hook_list(&key, value);
                if !list.is_empty() {
                    debug!("Found {} hook(s) in settings for {}", list.len(), event_type);
                    hooks.insert(event_type, list);
                }
            }
        }
        hooks
    }

    async fn load_workspace_file(&self) -> HookMap {
        let Some(path) = self.workspace_file() else {
            return HookMap::new();
        };

        let content = match self.reader.read_text(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No workspace hooks loaded: {}", e);
                return HookMap::new();
            }
        };

        match parse_workspace_document(&content) {
            Ok(hooks) => hooks,
            Err(e) => {
                debug!("Ignoring unparsable hooks file {}: {}", path.display(), e);
                HookMap::new()
            }
        }
    }
}

/// Parse the `{ "hooks": { "<event-type>": [...] | {...} } }` document.
///
/// Fails only when the text is not JSON. Unknown event types and invalid
/// entries are dropped with a warning.
pub fn parse_workspace_document(content: &str) -> Result<HookMap, serde_json::Error> {
    let document: Value = serde_json::from_str(content)?;
    let mut hooks = HookMap::new();

    let Some(section) = document.get(SETTINGS_NAMESPACE) else {
        return Ok(hooks);
    };
    let Some(section) = section.as_object() else {
        warn!("Ignoring 'hooks' section: expected an object");
        return Ok(hooks);
    };

    for (name, value) in section {
        let event_type = match name.parse::<HookEventType>() {
            Ok(event_type) => event_type,
            Err(e) => {
                warn!("Ignoring hooks for {}", e);
                continue;
            }
        };
        let list = parse_hook_list(name, value.clone());
        if !list.is_empty() {
            hooks.entry(event_type).or_default().extend(list);
        }
    }

    Ok(hooks)
}

/// An array becomes a list, a bare object a one-element list, anything else nothing
fn parse_hook_list(source: &str, value: Value) -> Vec<HookConfiguration> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(_) => vec![value],
        other => {
            warn!(
                "Ignoring hooks under '{}': expected an array or object, got {}",
                source, other
            );
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match RawHookConfig::from_value(entry).and_then(HookConfiguration::try_from) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Ignoring hook #{} under '{}': {}", index, source, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definition::HookAction;
    use mockall::predicate::eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn no_settings() -> MockSettingsSource {
        let mut settings = MockSettingsSource::new();
        settings.expect_get_value().returning(|_| None);
        settings
    }

    fn file_returning(content: &'static str) -> MockFileReader {
        let mut reader = MockFileReader::new();
        reader
            .expect_read_text()
            .returning(move |_| Ok(content.to_string()));
        reader
    }

    fn missing_file() -> MockFileReader {
        let mut reader = MockFileReader::new();
        reader
            .expect_read_text()
            .returning(|path| Err(ReadError::NotFound(path.to_path_buf())));
        reader
    }

    fn loader(settings: MockSettingsSource, reader: MockFileReader) -> ConfigLoader {
        ConfigLoader::new(
            Arc::new(settings),
            Arc::new(reader),
            Some(PathBuf::from("/work")),
        )
    }

    #[tokio::test]
    async fn test_workspace_file_round_trip() {
        let loader = loader(
            no_settings(),
            file_returning(
                r#"{"hooks":{"pre-commit":[{"script":"./a.sh","timeout":1000,"abortOnFailure":true}]}}"#,
            ),
        );

        let hooks = loader.load().await;
        assert_eq!(hooks.len(), 1);
        let list = &hooks[&HookEventType::PreCommit];
        assert_eq!(list.len(), 1);
        assert_eq!(
            list[0].action(),
            &HookAction::Script {
                path: PathBuf::from("./a.sh")
            }
        );
        assert_eq!(list[0].timeout_ms(), 1000);
        assert!(list[0].abort_on_failure());
        assert!(!list[0].is_async());
    }

    #[tokio::test]
    async fn test_reads_file_under_workspace_config_dir() {
        let mut reader = MockFileReader::new();
        reader
            .expect_read_text()
            .with(eq(Path::new("/work/.vscode/hooks.json")))
            .times(1)
            .returning(|_| Ok(r#"{"hooks":{}}"#.to_string()));

        let hooks = loader(no_settings(), reader).load().await;
        assert!(hooks.is_empty());
    }

    #[tokio::test]
    async fn test_bare_object_is_single_element_list() {
        let loader = loader(
            no_settings(),
            file_returning(r#"{"hooks":{"file-save":{"command":"echo saved"}}}"#),
        );

        let hooks = loader.load().await;
        assert_eq!(hooks[&HookEventType::FileSave].len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_event_type_dropped_others_kept() {
        let loader = loader(
            no_settings(),
            file_returning(
                r#"{"version":2,"hooks":{"pre-xyz":[{"command":"echo x"}],"pre-push":[{"command":"echo p"}]}}"#,
            ),
        );

        let hooks = loader.load().await;
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[&HookEventType::PrePush][0].label(), "echo p");
    }

    #[tokio::test]
    async fn test_missing_or_broken_file_contributes_nothing() {
        assert!(loader(no_settings(), missing_file()).load().await.is_empty());
        assert!(
            loader(no_settings(), file_returning("{not json"))
                .load()
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_invalid_entries_dropped_individually() {
        let loader = loader(
            no_settings(),
            file_returning(
                r#"{"hooks":{"pre-commit":[
                    {"script":"a.sh","command":"echo both"},
                    {"command":"echo ok"},
                    {"timeout":10}
                ]}}"#,
            ),
        );

        let hooks = loader.load().await;
        let labels: Vec<_> = hooks[&HookEventType::PreCommit]
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, ["echo ok"]);
    }

    #[tokio::test]
    async fn test_settings_run_before_workspace_entries() {
        let mut settings = MockSettingsSource::new();
        settings
            .expect_get_value()
            .with(eq("hooks.preCommit"))
            .returning(|_| Some(json!([{"command": "echo global"}])));
        settings.expect_get_value().returning(|_| None);

        let loader = loader(
            settings,
            file_returning(r#"{"hooks":{"pre-commit":[{"command":"echo workspace"}]}}"#),
        );

        let hooks = loader.load().await;
        let labels: Vec<_> = hooks[&HookEventType::PreCommit]
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, ["echo global", "echo workspace"]);
    }

    #[tokio::test]
    async fn test_malformed_settings_value_dropped() {
        let mut settings = MockSettingsSource::new();
        settings
            .expect_get_value()
            .with(eq("hooks.fileSave"))
            .returning(|_| Some(json!("echo not-a-hook")));
        settings
            .expect_get_value()
            .with(eq("hooks.prePrompt"))
            .returning(|_| Some(json!({"script": "/opt/filter.py"})));
        settings.expect_get_value().returning(|_| None);

        let hooks = loader(settings, missing_file()).load().await;
        assert!(!hooks.contains_key(&HookEventType::FileSave));
        assert_eq!(hooks[&HookEventType::PrePrompt].len(), 1);
    }

    #[tokio::test]
    async fn test_no_workspace_skips_file() {
        let mut reader = MockFileReader::new();
        reader.expect_read_text().never();

        let loader = ConfigLoader::new(Arc::new(no_settings()), Arc::new(reader), None);
        assert!(loader.load().await.is_empty());
        assert!(loader.workspace_file().is_none());
    }

    #[tokio::test]
    async fn test_fs_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.json");
        std::fs::write(&path, "{}").unwrap();

        assert_eq!(FsFileReader.read_text(&path).await.unwrap(), "{}");
        let err = FsFileReader
            .read_text(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReadError::NotFound(_)));
    }

    #[test]
    fn test_non_object_hooks_section() {
        let hooks = parse_workspace_document(r#"{"hooks":[1,2]}"#).unwrap();
        assert!(hooks.is_empty());
        assert!(parse_workspace_document("[").is_err());
    }
}
