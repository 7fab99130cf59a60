//! Reload hooks when their configuration files change

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::engine::HookEngine;

/// Quiet period before a burst of file events triggers one reload
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches configuration files and reloads the engine when they change.
///
/// Dropping the watcher stops it.
pub struct HooksWatcher {
    task: JoinHandle<()>,
}

impl HooksWatcher {
    /// Start watching `files`. Must be called from within a Tokio runtime.
    ///
    /// A file whose directory does not exist yet is picked up once that
    /// directory is created, provided the directory above it exists. Files
    /// deeper than that are skipped with a warning.
    pub fn start(engine: Arc<HookEngine>, files: Vec<PathBuf>) -> notify::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let targets = files.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if is_relevant(&event, &targets) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => warn!("Hook config watch error: {}", e),
            }
        })?;

        // Files still waiting for their parent directory to appear
        let mut pending = Vec::new();
        for file in files {
            match watch_root(&file) {
                Some(WatchRoot::Parent(dir)) => {
                    debug!("Watching {} for {}", dir.display(), file.display());
                    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
                }
                Some(WatchRoot::Grandparent(dir)) => {
                    debug!("Watching {} until {} appears", dir.display(), file.display());
                    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
                    pending.push(file);
                }
                None => warn!(
                    "Not watching {}: its directory does not exist",
                    file.display()
                ),
            }
        }

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Collapse editor save bursts into a single reload
                loop {
                    match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }
                pending.retain(|file| !attach_parent(&mut watcher, file));
                info!("Hook configuration changed, reloading");
                engine.reload().await;
            }
        });

        Ok(Self { task })
    }
}

impl Drop for HooksWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum WatchRoot {
    Parent(PathBuf),
    Grandparent(PathBuf),
}

/// Directory to watch for `file`: its parent, or the directory above a
/// missing parent. Never climbs further.
fn watch_root(file: &Path) -> Option<WatchRoot> {
    let parent = file.parent()?;
    if parent.is_dir() {
        return Some(WatchRoot::Parent(parent.to_path_buf()));
    }
    let grandparent = parent.parent()?;
    grandparent
        .is_dir()
        .then(|| WatchRoot::Grandparent(grandparent.to_path_buf()))
}

/// Watch `file`'s parent once it exists. Returns false while it is still missing.
fn attach_parent(watcher: &mut RecommendedWatcher, file: &Path) -> bool {
    let Some(dir) = file.parent().filter(|dir| dir.is_dir()) else {
        return false;
    };
    match watcher.watch(dir, RecursiveMode::NonRecursive) {
        Ok(()) => debug!("Watching {} for {}", dir.display(), file.display()),
        Err(e) => warn!("Cannot watch {}: {}", dir.display(), e),
    }
    true
}

fn is_relevant(event: &Event, targets: &[PathBuf]) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|changed| targets.iter().any(|target| changed.ends_with(target) || target.starts_with(changed)))
}
