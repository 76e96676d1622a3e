use super::*;
use crate::config::WatchMode;
use crate::error::CatalogError;
use crate::indexing::is_update_marker;
use notify::{
    Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use vscmirror_api::RefreshTrigger;

const DEBOUNCE: Duration = Duration::from_millis(500);

struct FsWatcher {
    _watcher: Box<dyn NotifyWatcher + Send>,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path, mode: WatchMode) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        };
        let mut watcher: Box<dyn NotifyWatcher + Send> = match mode {
            WatchMode::Poll(interval) => Box::new(PollWatcher::new(
                handler,
                Config::default().with_poll_interval(interval),
            )?),
            _ => Box::new(RecommendedWatcher::new(handler, Config::default())?),
        };
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await? {
                Ok(event) => return Some(event),
                Err(e) => tracing::debug!("Watch error: {}", e),
            }
        }
    }
}

/// Creations and modifications of an `updated.json` marker.
fn is_marker_change(event: &Event) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| is_update_marker(path))
}

/// Fires once per burst of marker changes, `DEBOUNCE` after the first one.
///
/// Later events do not push the deadline back, so a busy tree cannot delay a
/// refresh indefinitely.
#[derive(Debug, Default)]
struct MarkerDebounce {
    deadline: Option<Instant>,
}

impl MarkerDebounce {
    fn observe(&mut self, event: &Event, now: Instant) {
        if self.deadline.is_none() && is_marker_change(event) {
            self.deadline = Some(now + DEBOUNCE);
        }
    }

    fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When to fire; only meaningful while pending.
    fn deadline(&self) -> Instant {
        self.deadline.unwrap_or_else(Instant::now)
    }

    fn fire(&mut self) {
        self.deadline = None;
    }
}

impl CatalogEngine {
    /// Watches the extensions root and fires `trigger` once per burst of
    /// marker changes. The task exits when `cancel_token` is cancelled.
    pub(crate) fn start_watch(
        &self,
        trigger: Arc<dyn RefreshTrigger>,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        let root = self.config.extensions_root.clone();
        let mut watcher = FsWatcher::new(&root, self.config.watch)
            .map_err(|e| CatalogError::Internal(e.to_string()))?;

        tokio::spawn(async move {
            tracing::info!("Started watching {}", root.display());
            let mut debounce = MarkerDebounce::default();

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        break;
                    }
                    event = watcher.next_event_async() => {
                        match event {
                            Some(e) => debounce.observe(&e, Instant::now()),
                            None => break,
                        }
                    }
                    _ = tokio::time::sleep_until(debounce.deadline()), if debounce.is_pending() => {
                        debounce.fire();
                        tracing::info!("Detected updated.json change, refreshing extension catalog");
                        trigger.trigger();
                    }
                }
            }
            tracing::info!("Watcher task ended for {}", root.display());
        });

        Ok(())
    }
}
