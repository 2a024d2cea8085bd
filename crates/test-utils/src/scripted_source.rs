use std::time::Duration;

use chisel::types::ChangeEvent;
use chisel::watch::ChangeSource;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A change source that replays a fixed script.
///
/// Each entry is sent `at` after `start()` was called, measured on the tokio
/// clock, so paused-time tests are deterministic. Entries must be in
/// ascending time order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Vec<(Duration, ChangeEvent)>,
    task: Option<JoinHandle<()>>,
    stopped: bool,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, millis: u64, path: &str) -> Self {
        self.script
            .push((Duration::from_millis(millis), ChangeEvent::modified(path)));
        self
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped
    }
}

impl ChangeSource for ScriptedSource {
    fn start(&mut self, tx: mpsc::Sender<ChangeEvent>) -> anyhow::Result<()> {
        let script = std::mem::take(&mut self.script);
        self.task = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            for (at, event) in script {
                tokio::time::sleep_until(start + at).await;
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            // Keep the channel open; the session ends on its shutdown signal.
            std::future::pending::<()>().await;
        }));
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
