//! The recurring scheduler's single worker task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{Local, TimeDelta};
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use usrsvc_core::ScheduleSpec;

use super::{
    format_instant, next_occurrence, Phase, SchedulerError, TaskExecutor, TaskRunOutcome,
};

/// Owns one background worker for one [`TaskExecutor`].
///
/// Created by [`RecurringScheduler::start`], which spawns the worker and
/// hands back a [`SchedulerHandle`]. The worker is never restarted.
pub struct RecurringScheduler<E> {
    spec: ScheduleSpec,
    executor: E,
    stop: CancellationToken,
    phase: watch::Sender<Phase>,
}

/// Caller-side view of a running [`RecurringScheduler`].
///
/// The stop token is written only here; the phase channel is written only by
/// the worker.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: CancellationToken,
    phase: watch::Receiver<Phase>,
}

impl<E: TaskExecutor> RecurringScheduler<E> {
    /// Spawns the worker on the current Tokio runtime.
    ///
    /// The worker runs the executor once immediately, then waits for the
    /// first occurrence of `spec` and fires every `spec.period()` after it.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a Tokio
    /// runtime.
    pub fn start(spec: ScheduleSpec, executor: E) -> Result<SchedulerHandle, SchedulerError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let stop = CancellationToken::new();
        let (phase_tx, phase_rx) = watch::channel(Phase::NotStarted);
        let scheduler = Self {
            spec,
            executor,
            stop: stop.clone(),
            phase: phase_tx,
        };

        // Detached on purpose: completion is observed through the phase channel.
        runtime.spawn(scheduler.run());

        Ok(SchedulerHandle {
            stop,
            phase: phase_rx,
        })
    }

    async fn run(self) {
        // Eager first run, independent of the schedule and not cancellable.
        self.fire().await;

        let now = Local::now();
        let occurrence = next_occurrence(&now, &self.spec);
        let wait = occurrence.wait();
        let first_deadline = Instant::now() + wait;
        // A past target fires at once, so the cadence is anchored at `now`.
        let first_at = now + to_delta(wait);
        tracing::info!(
            next_run = %format_instant(&occurrence.at),
            delay = ?wait,
            "scheduler: next maintenance run scheduled"
        );
        self.enter(Phase::AwaitingFirstFire);

        tokio::select! {
            biased;
            () = self.stop.cancelled() => {
                tracing::info!("scheduler: shutting down before first scheduled run");
                self.finish();
                return;
            }
            () = tokio::time::sleep_until(first_deadline) => {}
        }

        self.enter(Phase::Periodic);
        self.fire().await;

        let period = self.spec.period();
        loop {
            // Ticks that fell inside a slow run are skipped, never queued.
            let elapsed = Instant::now().saturating_duration_since(first_deadline);
            let offset = next_tick_offset(elapsed, period);
            tracing::info!(
                next_run = %format_instant(&(first_at + to_delta(offset))),
                "scheduler: next maintenance run scheduled"
            );

            tokio::select! {
                biased;
                () = self.stop.cancelled() => break,
                () = tokio::time::sleep_until(first_deadline + offset) => self.fire().await,
            }
        }

        tracing::info!("scheduler: shutting down");
        self.finish();
    }

    /// Runs the executor once. A panic is reported like any other failure.
    async fn fire(&self) {
        let result = AssertUnwindSafe(self.executor.run_once())
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!(
                    "maintenance run panicked: {}",
                    panic_message(payload.as_ref())
                ))
            });
        TaskRunOutcome::from(result).report();
    }

    fn enter(&self, phase: Phase) {
        tracing::debug!(phase = %phase, "scheduler: phase transition");
        self.phase.send_replace(phase);
    }

    fn finish(&self) {
        self.enter(Phase::Stopping);
        self.enter(Phase::Stopped);
    }
}

impl SchedulerHandle {
    /// Current worker phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// A receiver that observes every phase the worker enters from now on.
    #[cfg(test)]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Requests shutdown and waits until the worker has exited.
    ///
    /// Idempotent and safe to call concurrently: every caller returns once
    /// the worker is gone. An in-flight executor run is allowed to finish.
    pub async fn stop(&self) {
        self.stop.cancel();
        let mut phase = self.phase.clone();
        // An Err means the worker dropped its sender, i.e. it has already exited.
        let _ = phase.wait_for(|p| *p == Phase::Stopped).await;
    }
}

/// Offset from the cadence anchor of the first tick strictly after `elapsed`.
///
/// `period` is never zero; `ScheduleSpec` rejects it.
fn next_tick_offset(elapsed: Duration, period: Duration) -> Duration {
    let ticks = elapsed.as_nanos() / period.as_nanos() + 1;
    u32::try_from(ticks)
        .ok()
        .and_then(|n| period.checked_mul(n))
        .unwrap_or(elapsed + period)
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or_else(|_| TimeDelta::zero())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
