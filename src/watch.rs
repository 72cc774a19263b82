use crate::registry::Registry;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Quiet period used to coalesce a burst of events into one reload.
const SETTLE: Duration = Duration::from_millis(250);

/// Keeps the underlying watcher alive; dropping it stops automatic reloads.
#[derive(Debug)]
pub struct ReloadWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for ReloadWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn is_definition_change(event: &Event) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant_kind
        && event.paths.iter().any(|p| {
            p.is_dir()
                || matches!(
                    p.extension().and_then(|s| s.to_str()),
                    Some("toml" | "yaml" | "yml")
                )
        })
}

/// Watches every source root of `registry` and reloads it on change.
pub fn spawn(registry: Arc<Registry>) -> notify::Result<ReloadWatcher> {
    let (event_sender, mut event_receiver) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if is_definition_change(&event) && event_sender.send(()).is_err() {
                    debug!("reload channel closed, dropping file system event");
                }
            }
            Err(e) => warn!("file system watcher error: {}", e),
        },
        notify::Config::default(),
    )?;

    for root in registry.sources() {
        watcher.watch(Path::new(root), RecursiveMode::Recursive)?;
    }

    let task = tokio::spawn(async move {
        while event_receiver.recv().await.is_some() {
            loop {
                tokio::time::sleep(SETTLE).await;
                let mut drained = false;
                while event_receiver.try_recv().is_ok() {
                    drained = true;
                }
                if !drained {
                    break;
                }
            }

            // Errors are already logged by the registry; the old snapshot stays live.
            let registry = Arc::clone(&registry);
            if let Err(e) = tokio::task::spawn_blocking(move || registry.reload()).await {
                warn!("reload task failed: {}", e);
            }
        }
    });

    Ok(ReloadWatcher { _watcher: watcher, task })
}
