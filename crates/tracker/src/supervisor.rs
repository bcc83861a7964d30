//! Supervised lifecycle for the reconciliation loop.
//!
//! The loop is an explicit background task owned by whoever builds the
//! supervisor, not by any presentation layer. Arming is idempotent; the
//! loop tears itself down when the active set drains and can be re-armed
//! at any time once new campaigns activate. Ticks never overlap: each
//! one runs to completion before the interval is consulted again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::reconciler::Reconciler;

pub struct TrackerSupervisor {
    reconciler: Arc<Reconciler>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TrackerSupervisor {
    pub fn new(reconciler: Arc<Reconciler>, poll_interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            reconciler,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handle: std::sync::Mutex::new(None),
        }
    }

    /// Arm the reconciliation loop. Returns `false` when it was already
    /// running; calling repeatedly is safe.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("tracker loop already running");
            return false;
        }

        let reconciler = Arc::clone(&self.reconciler);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = poll_interval.as_secs(),
                "tracker loop armed"
            );

            loop {
                // The first interval tick fires immediately.
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown_rx.changed() => {
                        info!("tracker loop shutting down");
                        break;
                    }
                }

                let summary = reconciler.run_tick().await;

                if !summary.store_read_failed && summary.remaining_active() == 0 {
                    info!("no active campaigns remain; tracker loop tearing down");
                    break;
                }
            }

            running.store(false, Ordering::SeqCst);
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the loop to stop after the in-flight tick, if any. In-flight
    /// work completes and is discarded rather than racing a torn-down
    /// context.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the loop task to finish. Returns immediately when the
    /// loop was never armed.
    pub async fn wait(&self) {
        let handle = self.handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "tracker loop task panicked");
            }
        }
    }
}
