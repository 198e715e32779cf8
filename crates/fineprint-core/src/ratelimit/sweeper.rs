//! Background sweep task and its shutdown handle.

use crate::ratelimit::limiter::SlidingWindowLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Sweep cadence used when none is configured
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Owner of a running sweep task
///
/// Call [`shutdown`](SweeperHandle::shutdown) to stop the task and wait for
/// it. Dropping the handle also stops the task, without waiting.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "rate limiter sweeper ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl SlidingWindowLimiter {
    /// Start sweeping empty buckets every `interval` on the current tokio
    /// runtime
    ///
    /// The first sweep happens one full interval after the call. A zero
    /// interval is raised to one millisecond.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let limiter = Arc::clone(self);
        let period = interval.max(Duration::from_millis(1));
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(interval_ms = period.as_millis() as u64, "rate limiter sweeper started");

            loop {
                tokio::select! {
                    // Resolves on an explicit stop and when the handle is dropped.
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        tracing::trace!(removed, "rate limiter sweep tick");
                    }
                }
            }

            tracing::debug!("rate limiter sweeper stopped");
        });

        SweeperHandle {
            stop: Some(stop),
            task,
        }
    }
}
