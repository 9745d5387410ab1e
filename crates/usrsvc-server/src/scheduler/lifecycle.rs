//! Process-level owner of the recurring scheduler.

use std::sync::atomic::{AtomicBool, Ordering};

use usrsvc_core::ScheduleSpec;

use super::{Phase, RecurringScheduler, SchedulerError, SchedulerHandle, TaskExecutor};

/// Starts the scheduler at boot and stops it exactly once at shutdown.
///
/// Share it behind an `Arc` between the signal path and the server's own
/// shutdown path; [`LifecycleCoordinator::request_stop`] may be called from
/// either, any number of times.
#[derive(Debug)]
pub struct LifecycleCoordinator {
    scheduler: Option<SchedulerHandle>,
    stopped_logged: AtomicBool,
}

impl LifecycleCoordinator {
    /// Starts one [`RecurringScheduler`] for `executor`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the worker cannot be spawned.
    pub fn start<E: TaskExecutor>(
        spec: ScheduleSpec,
        executor: E,
    ) -> Result<Self, SchedulerError> {
        let handle = RecurringScheduler::start(spec, executor)?;
        Ok(Self {
            scheduler: Some(handle),
            stopped_logged: AtomicBool::new(false),
        })
    }

    /// A coordinator with no worker; stopping it returns immediately.
    #[cfg(test)]
    #[must_use]
    pub fn idle() -> Self {
        Self {
            scheduler: None,
            stopped_logged: AtomicBool::new(false),
        }
    }

    /// Worker phase, or `None` when no scheduler was started.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.scheduler.as_ref().map(SchedulerHandle::phase)
    }

    /// Signals the worker to stop and waits until it has exited.
    ///
    /// Exactly one call that sees the worker gone emits the `stopped` record,
    /// even if an earlier caller was dropped while waiting.
    pub async fn request_stop(&self) {
        let Some(scheduler) = &self.scheduler else {
            if !self.stopped_logged.swap(true, Ordering::AcqRel) {
                tracing::debug!("scheduler: stop requested but no scheduler was started");
            }
            return;
        };

        scheduler.stop().await;

        if !self.stopped_logged.swap(true, Ordering::AcqRel) {
            tracing::info!("scheduler: stopped");
        }
    }
}
