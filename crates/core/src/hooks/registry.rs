//! In-memory registry of hook configurations keyed by event type

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::debug;

use super::definition::HookConfiguration;
use super::event::HookEventType;

/// Freshly loaded configurations, grouped by event type
pub type HookMap = BTreeMap<HookEventType, Vec<HookConfiguration>>;

type Entries = HashMap<HookEventType, Vec<Arc<HookConfiguration>>>;

/// Ordered hook lists per event type.
///
/// Registration order is execution order. Readers always get a snapshot, so a
/// concurrent `replace_all` never changes a list that is already being iterated.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    entries: Arc<RwLock<Entries>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `config` to the list for `event_type`.
    ///
    /// The returned handle removes exactly this instance, even if an equal
    /// configuration is registered elsewhere.
    pub fn register(&self, event_type: HookEventType, config: HookConfiguration) -> HookRegistration {
        let config = Arc::new(config);
        self.write()
            .entry(event_type)
            .or_default()
            .push(Arc::clone(&config));
        debug!("Registered hook '{}' for {}", config.label(), event_type);

        HookRegistration {
            entries: Arc::downgrade(&self.entries),
            event_type,
            config,
            disposed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the hooks for `event_type`, in execution order
    pub fn list(&self, event_type: HookEventType) -> Vec<Arc<HookConfiguration>> {
        self.read().get(&event_type).cloned().unwrap_or_default()
    }

    pub fn has(&self, event_type: HookEventType) -> bool {
        self.read().get(&event_type).is_some_and(|list| !list.is_empty())
    }

    pub fn len(&self, event_type: HookEventType) -> usize {
        self.read().get(&event_type).map_or(0, Vec::len)
    }

    pub fn clear(&self, event_type: HookEventType) {
        self.write().remove(&event_type);
    }

    /// Discard every entry for every event type and install `hooks`
    pub fn replace_all(&self, hooks: HookMap) {
        let fresh: Entries = hooks
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(event_type, list)| (event_type, list.into_iter().map(Arc::new).collect()))
            .collect();
        *self.write() = fresh;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`HookRegistry::register`]
#[must_use = "dropping the handle keeps the hook registered; call dispose() to remove it"]
#[derive(Debug)]
pub struct HookRegistration {
    entries: Weak<RwLock<Entries>>,
    event_type: HookEventType,
    config: Arc<HookConfiguration>,
    disposed: AtomicBool,
}

impl HookRegistration {
    pub fn event_type(&self) -> HookEventType {
        self.event_type
    }

    pub fn configuration(&self) -> &Arc<HookConfiguration> {
        &self.config
    }

    /// Remove the registered instance. Calling it again does nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(entries) = self.entries.upgrade() else {
            return;
        };
        let mut entries = entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = entries.get_mut(&self.event_type) {
            list.retain(|c| !Arc::ptr_eq(c, &self.config));
            if list.is_empty() {
                entries.remove(&self.event_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(text: &str) -> HookConfiguration {
        HookConfiguration::command(format!("echo {}", text), Vec::<String>::new()).unwrap()
    }

    #[test]
    fn test_empty_registry() {
        let registry = HookRegistry::new();
        for event_type in HookEventType::ALL {
            assert!(!registry.has(event_type));
            assert!(registry.list(event_type).is_empty());
        }
    }

    #[test]
    fn test_register_then_dispose() {
        let registry = HookRegistry::new();
        let handle = registry.register(HookEventType::PreCommit, echo("a"));
        assert!(registry.has(HookEventType::PreCommit));
        assert_eq!(handle.event_type(), HookEventType::PreCommit);
        assert!(Arc::ptr_eq(
            handle.configuration(),
            &registry.list(HookEventType::PreCommit)[0]
        ));

        handle.dispose();
        assert!(!registry.has(HookEventType::PreCommit));

        // Second dispose is a no-op
        handle.dispose();
        assert!(!registry.has(HookEventType::PreCommit));
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let registry = HookRegistry::new();
        let _a = registry.register(HookEventType::FileSave, echo("a"));
        let _b = registry.register(HookEventType::FileSave, echo("b"));
        let _c = registry.register(HookEventType::FileSave, echo("c"));

        let labels: Vec<_> = registry
            .list(HookEventType::FileSave)
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, ["echo a", "echo b", "echo c"]);
    }

    #[test]
    fn test_dispose_removes_by_identity_not_value() {
        let registry = HookRegistry::new();
        let first = registry.register(HookEventType::PrePush, echo("same"));
        let second = registry.register(HookEventType::PrePush, echo("same"));

        first.dispose();
        let remaining = registry.list(HookEventType::PrePush);
        assert_eq!(remaining.len(), 1);
        assert!(Arc::ptr_eq(&remaining[0], second.configuration()));
    }

    #[test]
    fn test_clear_only_touches_one_type() {
        let registry = HookRegistry::new();
        let _a = registry.register(HookEventType::PrePull, echo("a"));
        let _b = registry.register(HookEventType::PrePush, echo("b"));

        registry.clear(HookEventType::PrePull);
        assert!(!registry.has(HookEventType::PrePull));
        assert!(registry.has(HookEventType::PrePush));
    }

    #[test]
    fn test_replace_all_discards_previous_content() {
        let registry = HookRegistry::new();
        let stale = registry.register(HookEventType::PreCommit, echo("old"));
        let _other = registry.register(HookEventType::PrePrompt, echo("prompt"));

        let mut fresh = HookMap::new();
        fresh.insert(HookEventType::PreCommit, vec![echo("new-1"), echo("new-2")]);
        registry.replace_all(fresh);

        let labels: Vec<_> = registry
            .list(HookEventType::PreCommit)
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, ["echo new-1", "echo new-2"]);
        assert!(!registry.has(HookEventType::PrePrompt));

        // Disposing a handle from before the reload must not remove new entries
        stale.dispose();
        assert_eq!(registry.len(HookEventType::PreCommit), 2);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_reload() {
        let registry = HookRegistry::new();
        let _a = registry.register(HookEventType::FileSave, echo("a"));
        let snapshot = registry.list(HookEventType::FileSave);

        registry.replace_all(HookMap::new());
        assert_eq!(snapshot.len(), 1);
        assert!(!registry.has(HookEventType::FileSave));
    }

    #[test]
    fn test_dispose_after_registry_dropped() {
        let registry = HookRegistry::new();
        let handle = registry.register(HookEventType::FileSave, echo("a"));
        drop(registry);
        handle.dispose();
    }
}
