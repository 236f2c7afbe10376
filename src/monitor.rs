//! Background revalidation loop.
//!
//! A single Tokio task drives the manager:
//! - every `poll_interval` it runs a remote check (skipped while blocked)
//! - `refresh_now` triggers an immediate check unless one is running
//! - when the loaded license reaches `expires_at` it re-validates locally
//!
//! Remote checks run on the blocking pool so the executor never waits on
//! the network.

use crate::manager::{LicenseManager, LoopState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay past `expires_at` before the expiry check runs.
const EXPIRY_SLACK: Duration = Duration::from_millis(250);

/// Starts the revalidation loop.
pub struct Monitor;

impl Monitor {
    /// Spawn the loop for `manager`.
    ///
    /// Must be called from within a Tokio runtime. The first scheduled
    /// check runs immediately.
    pub fn start(manager: Arc<LicenseManager>) -> MonitorHandle {
        let refresh = Arc::new(Notify::new());
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run(Arc::clone(&manager), Arc::clone(&refresh), stop_rx));

        MonitorHandle {
            manager,
            refresh,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running loop. Dropping it stops the loop.
pub struct MonitorHandle {
    manager: Arc<LicenseManager>,
    refresh: Arc<Notify>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Request an immediate out-of-cycle check. Works in every state,
    /// including `Blocked`.
    ///
    /// Dropped while a check is already in flight; that check's answer is
    /// the refresh.
    pub fn refresh_now(&self) {
        if self.manager.check_in_flight() {
            debug!("check already in flight, refresh dropped");
            return;
        }
        self.refresh.notify_one();
    }

    /// Whether the loop task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for it to exit. A check already in flight
    /// is allowed to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "license monitor task failed");
            }
        }
    }
}

async fn run(
    manager: Arc<LicenseManager>,
    refresh: Arc<Notify>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = interval(manager.config().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut expiry = manager.subscribe_expiry();

    info!(
        poll_interval_secs = manager.config().poll_interval.as_secs(),
        "license monitor started"
    );

    loop {
        let deadline = expiry_deadline(&manager, *expiry.borrow_and_update());

        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                if manager.state() == LoopState::Blocked {
                    debug!("license blocked, skipping scheduled check");
                    continue;
                }
                check(&manager).await;
            }
            _ = refresh.notified() => check(&manager).await,
            changed = expiry.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = wait_for(deadline) => {
                let verdict = manager.handle_expiry();
                debug!(valid = verdict.valid, "expiry timer fired");
            }
        }
    }

    info!("license monitor stopped");
}

async fn check(manager: &Arc<LicenseManager>) {
    let manager = Arc::clone(manager);
    match tokio::task::spawn_blocking(move || manager.revalidate()).await {
        Ok(outcome) => debug!(?outcome, "revalidation finished"),
        Err(e) => warn!(error = %e, "revalidation task failed"),
    }
}

/// Instant at which the expiry check should run, if a valid license is loaded.
fn expiry_deadline(manager: &LicenseManager, expires_at: Option<DateTime<Utc>>) -> Option<Instant> {
    let expires_at = expires_at?;
    let remaining = (expires_at - manager.clock().now_utc())
        .to_std()
        .unwrap_or(Duration::ZERO);
    Some(Instant::now() + remaining + EXPIRY_SLACK)
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
