//! The daily maintenance job: demote accounts older than a threshold.

use anyhow::Context;
use sqlx::PgPool;
use usrsvc_core::UserStatus;

use super::TaskExecutor;

/// Flips every account created more than `stale_after_months` months ago to
/// [`UserStatus::Demoted`].
#[derive(Clone)]
pub struct DemoteStaleUsers {
    pool: PgPool,
    stale_after_months: u32,
}

impl DemoteStaleUsers {
    #[must_use]
    pub fn new(pool: PgPool, stale_after_months: u32) -> Self {
        Self {
            pool,
            stale_after_months,
        }
    }
}

impl TaskExecutor for DemoteStaleUsers {
    /// Returns the number of users actually demoted by this run.
    ///
    /// Users already demoted are skipped. A failed update for one user is
    /// logged and does not abort the rest of the batch.
    async fn run_once(&self) -> anyhow::Result<u64> {
        let users = usrsvc_db::list_stale_users(&self.pool, self.stale_after_months)
            .await
            .context("failed to load stale users")?;

        if users.is_empty() {
            tracing::info!("scheduler: no stale users; skipping");
            return Ok(0);
        }

        let demoted = UserStatus::Demoted.as_i16();
        let mut updated = 0_u64;
        for user in users.iter().filter(|u| u.status != demoted) {
            match usrsvc_db::update_user_status(&self.pool, user.id, demoted).await {
                Ok(true) => updated += 1,
                Ok(false) => {
                    tracing::warn!(user_id = %user.id, "scheduler: user vanished before demotion");
                }
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "scheduler: failed to demote user");
                }
            }
        }

        tracing::info!(
            stale = users.len(),
            demoted = updated,
            "scheduler: stale users processed"
        );
        Ok(updated)
    }
}
