//! Background job scheduler.
//!
//! Owns the lifecycle of the daily stale-account demotion routine: one
//! worker task that runs the job once at boot, waits for the configured
//! wall-clock occurrence, then fires on a fixed period until asked to stop.
//! Shutdown is cooperative and observed only while the worker is waiting.

mod demote;
mod lifecycle;
mod occurrence;
mod worker;

use std::future::Future;

use thiserror::Error;

pub use demote::DemoteStaleUsers;
pub use lifecycle::LifecycleCoordinator;
pub use occurrence::{format_instant, next_occurrence};
pub use worker::{RecurringScheduler, SchedulerHandle};

/// The maintenance job driven by the scheduler.
///
/// The scheduler only logs the returned count; it does not interpret it.
/// Errors are logged and never stop the schedule.
pub trait TaskExecutor: Send + Sync + 'static {
    fn run_once(&self) -> impl Future<Output = anyhow::Result<u64>> + Send;
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` was called outside a Tokio runtime, so no worker can be spawned.
    #[error("no tokio runtime available to host the scheduler worker")]
    NoRuntime,
}

/// Where the worker is in its lifecycle. Written only by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    AwaitingFirstFire,
    Periodic,
    Stopping,
    Stopped,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not_started"),
            Phase::AwaitingFirstFire => write!(f, "awaiting_first_fire"),
            Phase::Periodic => write!(f, "periodic"),
            Phase::Stopping => write!(f, "stopping"),
            Phase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of one firing. Logged, then discarded.
#[derive(Debug)]
pub struct TaskRunOutcome {
    pub affected_count: u64,
    pub error: Option<anyhow::Error>,
}

impl TaskRunOutcome {
    fn report(&self) {
        match &self.error {
            None => tracing::info!(
                affected = self.affected_count,
                "scheduler: maintenance run complete"
            ),
            Some(e) => tracing::error!(error = %e, "scheduler: maintenance run failed"),
        }
    }
}

impl From<anyhow::Result<u64>> for TaskRunOutcome {
    fn from(result: anyhow::Result<u64>) -> Self {
        match result {
            Ok(affected_count) => Self {
                affected_count,
                error: None,
            },
            Err(e) => Self {
                affected_count: 0,
                error: Some(e),
            },
        }
    }
}
