// src/watch/watcher.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::SourcePatterns;

/// Something that delivers settled source changes to the pipeline.
pub trait ChangeSource: Send {
    /// Begin delivering events on `tx`.
    fn start(&mut self, tx: mpsc::Sender<ChangeEvent>) -> Result<()>;

    /// Stop delivering events. Safe to call more than once.
    fn stop(&mut self);
}

/// Map a notify event kind onto ours. Access and metadata-free "other"
/// events carry no content change and are dropped.
pub fn classify_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Added),
        EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Unsettled {
    first_kind: ChangeKind,
    deadline: Instant,
}

/// Per-path write-settle window.
///
/// Each observation pushes the path's deadline out by `window`; a path is
/// emitted once, after it has been quiet for the whole window. The emitted
/// kind is decided at that point from whether the file still exists.
#[derive(Debug)]
pub struct SettleBuffer {
    window: Duration,
    pending: HashMap<String, Unsettled>,
}

impl SettleBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub fn observe(&mut self, path: String, kind: ChangeKind, now: Instant) {
        let deadline = now + self.window;
        self.pending
            .entry(path)
            .and_modify(|u| u.deadline = deadline)
            .or_insert(Unsettled {
                first_kind: kind,
                deadline,
            });
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|u| u.deadline).min()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every path whose window has elapsed, sorted by path.
    pub fn take_due(&mut self, now: Instant, exists: impl Fn(&str) -> bool) -> Vec<ChangeEvent> {
        let mut due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, u)| u.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|path| {
                let unsettled = self.pending.remove(&path)?;
                let kind = settled_kind(unsettled.first_kind, exists(&path));
                Some(ChangeEvent::new(kind, path))
            })
            .collect()
    }
}

fn settled_kind(first: ChangeKind, exists_now: bool) -> ChangeKind {
    match (first, exists_now) {
        (_, false) => ChangeKind::Removed,
        (ChangeKind::Added, true) => ChangeKind::Added,
        _ => ChangeKind::Modified,
    }
}

/// Production change source backed by `notify::RecommendedWatcher`.
pub struct NotifyChangeSource {
    root: PathBuf,
    patterns: Arc<SourcePatterns>,
    settle: Duration,
    watcher: Option<RecommendedWatcher>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for NotifyChangeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyChangeSource")
            .field("root", &self.root)
            .field("settle", &self.settle)
            .field("running", &self.watcher.is_some())
            .finish()
    }
}

impl NotifyChangeSource {
    pub fn new(root: impl Into<PathBuf>, patterns: SourcePatterns, settle: Duration) -> Self {
        let root = root.into();
        // Canonicalize once so event paths strip cleanly.
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            patterns: Arc::new(patterns),
            settle,
            watcher: None,
            task: None,
        }
    }
}

/// Directory handed to notify: `src/` when present, else the whole root.
///
/// Every watched glob lives under `src/`, so this keeps `node_modules` and
/// build output out of the OS watch set.
pub fn watch_target(root: &Path) -> PathBuf {
    let src = root.join("src");
    if src.is_dir() { src } else { root.to_path_buf() }
}

impl ChangeSource for NotifyChangeSource {
    fn start(&mut self, tx: mpsc::Sender<ChangeEvent>) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }

        // notify calls back on its own thread; bridge into tokio.
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = raw_tx.send(event);
                }
                Err(err) => eprintln!("chisel: file watch error: {err}"),
            },
            Config::default(),
        )?;
        let target = watch_target(&self.root);
        watcher.watch(&target, RecursiveMode::Recursive)?;
        info!(root = ?self.root, target = ?target, "file watcher started");

        let task = tokio::spawn(settle_loop(
            raw_rx,
            self.root.clone(),
            Arc::clone(&self.patterns),
            SettleBuffer::new(self.settle),
            tx,
        ));

        self.watcher = Some(watcher);
        self.task = Some(task);
        Ok(())
    }

    fn stop(&mut self) {
        if self.watcher.take().is_some() {
            info!("file watcher stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for NotifyChangeSource {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn settle_loop(
    mut raw_rx: mpsc::UnboundedReceiver<Event>,
    root: PathBuf,
    patterns: Arc<SourcePatterns>,
    mut buffer: SettleBuffer,
    tx: mpsc::Sender<ChangeEvent>,
) {
    loop {
        let deadline = buffer.next_deadline();
        tokio::select! {
            maybe = raw_rx.recv() => {
                let Some(event) = maybe else { break };
                let Some(kind) = classify_kind(&event.kind) else { continue };
                let now = Instant::now();
                for path in &event.paths {
                    let Some(rel) = relative_str(&root, path) else { continue };
                    if patterns.is_watched(&rel) {
                        buffer.observe(rel, kind, now);
                    }
                }
            }
            _ = async {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            } => {
                for change in buffer.take_due(Instant::now(), |rel| root.join(rel).exists()) {
                    debug!(kind = %change.kind, path = %change.path, "settled change");
                    if tx.send(change).await.is_err() {
                        warn!("pipeline receiver dropped; stopping watcher loop");
                        return;
                    }
                }
            }
        }
    }
    debug!(pending = !buffer.is_empty(), "watcher event loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn notify_kinds_map_to_change_kinds() {
        assert_eq!(classify_kind(&EventKind::Create(CreateKind::File)), Some(ChangeKind::Added));
        assert_eq!(classify_kind(&EventKind::Modify(ModifyKind::Any)), Some(ChangeKind::Modified));
        assert_eq!(classify_kind(&EventKind::Remove(RemoveKind::File)), Some(ChangeKind::Removed));
        assert_eq!(classify_kind(&EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn watch_target_prefers_src_and_falls_back_to_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(watch_target(dir.path()), dir.path());

        std::fs::create_dir(dir.path().join("src")).unwrap();
        assert_eq!(watch_target(dir.path()), dir.path().join("src"));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_writes_settle_into_one_event() {
        let mut buffer = SettleBuffer::new(Duration::from_millis(50));
        let start = Instant::now();

        buffer.observe("src/a.ts".into(), ChangeKind::Added, start);
        buffer.observe("src/a.ts".into(), ChangeKind::Modified, start + Duration::from_millis(30));
        assert!(buffer.take_due(start + Duration::from_millis(60), |_| true).is_empty());

        let due = buffer.take_due(start + Duration::from_millis(80), |_| true);
        assert_eq!(due, vec![ChangeEvent::new(ChangeKind::Added, "src/a.ts")]);
        assert!(buffer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_file_settles_as_removed() {
        let mut buffer = SettleBuffer::new(Duration::from_millis(50));
        let start = Instant::now();
        buffer.observe("src/b.ts".into(), ChangeKind::Modified, start);
        buffer.observe("src/a.ts".into(), ChangeKind::Modified, start);

        let due = buffer.take_due(start + Duration::from_millis(50), |p| p != "src/b.ts");
        assert_eq!(
            due,
            vec![
                ChangeEvent::new(ChangeKind::Modified, "src/a.ts"),
                ChangeEvent::new(ChangeKind::Removed, "src/b.ts"),
            ]
        );
    }
}
