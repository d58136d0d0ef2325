//! Periodic background workers.
//!
//! A plugin that needs to do work on its own schedule implements [`Worker`]
//! and keeps a [`WorkerSlot`]. The slot owns at most one running loop:
//!
//! ```text
//! start ──▶ on_start ──▶ ┌─▶ interval elapsed? ──yes──▶ do_job ─┐
//!                        │          │ no                         │
//!                        │          ▼                            │
//!                        └──── sleep(tick) ◀─────────────────────┘
//!                                   │ cancelled
//!                                   ▼
//!                               on_stop
//! ```
//!
//! - `start` while a loop is alive does nothing.
//! - `stop` only raises the cancellation flag; it never waits.
//! - An error or panic in `do_job` is logged and the loop keeps ticking.
//! - Cancellation is observed between jobs. A `do_job` that never returns
//!   blocks the loop forever.
//!
//! Loops are detached tasks. Nothing joins them on shutdown.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Default granularity at which a worker loop checks its schedule.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// The periodic job of a plugin.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Name used in log records.
    fn worker_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs once per interval.
    async fn do_job(&self) -> anyhow::Result<()>;

    /// Runs once when the loop starts, before the first job.
    async fn on_start(&self) {}

    /// Runs once after the loop has observed cancellation.
    async fn on_stop(&self) {}
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Holds the (at most one) running loop of a plugin.
pub struct WorkerSlot {
    tick: Duration,
    running: Mutex<Option<Running>>,
}

impl Default for WorkerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerSlot {
    /// Creates an idle slot with the default one-second tick.
    pub fn new() -> Self {
        Self::with_tick(DEFAULT_TICK)
    }

    /// Creates an idle slot with a custom tick.
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick,
            running: Mutex::new(None),
        }
    }

    /// Returns the tick granularity.
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Starts the loop unless one is already alive.
    ///
    /// Returns `true` if a new loop was spawned. A loop that was asked to stop
    /// but has not finished yet still counts as alive.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<W: Worker>(&self, worker: Arc<W>, interval: Duration) -> bool {
        let mut running = self.running.lock();
        if let Some(current) = running.as_ref()
            && !current.handle.is_finished()
        {
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(worker, interval, self.tick, cancel.clone()));
        *running = Some(Running { cancel, handle });
        true
    }

    /// Asks the running loop to stop. Does not wait for it.
    pub fn stop(&self) {
        if let Some(current) = self.running.lock().as_ref() {
            current.cancel.cancel();
        }
    }

    /// Returns `true` while a loop is alive.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|current| !current.handle.is_finished())
    }
}

impl std::fmt::Debug for WorkerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerSlot")
            .field("tick", &self.tick)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_loop<W: Worker>(
    worker: Arc<W>,
    interval: Duration,
    tick: Duration,
    cancel: CancellationToken,
) {
    let name = worker.worker_name().to_owned();
    debug!(worker = %name, ?interval, "Worker started");
    worker.on_start().await;

    let mut last_run: Option<Instant> = None;
    while !cancel.is_cancelled() {
        if last_run.is_none_or(|at| at.elapsed() >= interval) {
            last_run = Some(Instant::now());
            match AssertUnwindSafe(worker.do_job()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(worker = %name, "Error during the task execution: {e:#}"),
                Err(_) => error!(worker = %name, "Task panicked"),
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(tick) => {}
        }
    }

    worker.on_stop().await;
    debug!(worker = %name, "Worker stopped");
}
