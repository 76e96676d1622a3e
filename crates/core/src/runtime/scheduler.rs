use super::*;
use crate::config::WatchMode;
use tokio::sync::mpsc;
use tokio::time::Instant;
use std::sync::Weak;
use tracing::{debug, info, warn};
use vscmirror_api::RefreshTrigger;
use vscmirror_api::models::human_duration;

/// Handle on a running scheduler.
///
/// Triggers are coalesced: while one is pending, further calls are dropped.
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
    cancel_token: CancellationToken,
}

impl RefreshTrigger for SchedulerHandle {
    fn trigger(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    fn stop(&self) {
        self.cancel_token.cancel();
    }
}

impl CatalogEngine {
    /// Spawns the refresh loop: one refresh right away, then one per interval or
    /// trigger, whichever comes first. Also starts the storage watcher unless
    /// watching is disabled.
    ///
    /// The loop ends on `stop()`, on engine shutdown, or once the engine itself has
    /// been dropped.
    pub fn start_scheduler(self: &Arc<Self>) -> Result<Arc<SchedulerHandle>> {
        let cancel_token = self.cancel_token.child_token();
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let handle = Arc::new(SchedulerHandle {
            trigger_tx,
            cancel_token: cancel_token.clone(),
        });

        if self.config.watch != WatchMode::Disabled {
            let trigger: Arc<dyn RefreshTrigger> = handle.clone();
            if let Err(e) = self.start_watch(trigger, cancel_token.clone()) {
                warn!("Storage watcher unavailable, relying on the timer: {}", e);
            }
        }

        tokio::spawn(Self::run_scheduler(
            Arc::downgrade(self),
            trigger_rx,
            cancel_token,
        ));
        Ok(handle)
    }

    /// Holds the engine only for the duration of each refresh, so dropping the
    /// last outside reference ends the loop.
    async fn run_scheduler(
        engine: Weak<Self>,
        mut trigger_rx: mpsc::Receiver<()>,
        cancel_token: CancellationToken,
    ) {
        let mut triggers_closed = false;
        info!("Refresh scheduler started");

        'scheduler: loop {
            let Some(current) = engine.upgrade() else {
                break;
            };
            let interval = human_duration(current.config.refresh_interval.as_secs());
            info!("Checking for new extensions...");
            match current.refresh().await {
                Ok(outcome) => info!("Check complete ({:?}). Next check in {}", outcome, interval),
                Err(e) => warn!("Scheduled refresh failed: {}", e),
            }
            let deadline = current.next_refresh_deadline();
            drop(current);

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break 'scheduler,
                    _ = tokio::time::sleep_until(deadline) => break,
                    msg = trigger_rx.recv(), if !triggers_closed => match msg {
                        Some(()) => {
                            info!("Change notification received, refreshing now");
                            break;
                        }
                        None => {
                            triggers_closed = true;
                            if engine.strong_count() == 0 {
                                break 'scheduler;
                            }
                            debug!("All trigger handles dropped, continuing on the timer");
                        }
                    },
                }
            }
        }
        info!("Refresh scheduler stopped");
    }

    /// The recorded next refresh, or one interval from now when that has passed.
    fn next_refresh_deadline(&self) -> Instant {
        let now = SystemTime::now();
        let next = self
            .index
            .refresh_times()
            .next
            .filter(|next| *next > now)
            .unwrap_or(now + self.config.refresh_interval);
        Instant::now() + next.duration_since(now).unwrap_or_default()
    }
}
