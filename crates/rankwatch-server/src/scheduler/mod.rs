//! Background job scheduler.
//!
//! Registers the daily rank update and alert jobs when
//! `RANKWATCH_SCHEDULER_ENABLED` is set. Both jobs run the same functions as
//! the cron HTTP triggers.

use std::sync::Arc;

use rankwatch_core::AppConfig;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::jobs::{run_keyword_alerts, run_rank_update, JobContext};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    jobs: Arc<JobContext>,
    config: &AppConfig,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_rank_update_job(&scheduler, Arc::clone(&jobs), &config.update_cron).await?;
    register_keyword_alerts_job(&scheduler, jobs, &config.alert_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the rank update job. Failures are logged; the next run retries.
async fn register_rank_update_job(
    scheduler: &JobScheduler,
    jobs: Arc<JobContext>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let jobs = Arc::clone(&jobs);

        Box::pin(async move {
            tracing::info!("scheduler: starting rank update run");
            match run_rank_update(&jobs).await {
                Ok(updated) => {
                    tracing::info!(updated, "scheduler: rank update run complete");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: rank update run failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered rank update job");
    Ok(())
}

/// Register the alert job. A failed dispatch is not retried until the next run.
async fn register_keyword_alerts_job(
    scheduler: &JobScheduler,
    jobs: Arc<JobContext>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let jobs = Arc::clone(&jobs);

        Box::pin(async move {
            tracing::info!("scheduler: starting keyword alerts run");
            match run_keyword_alerts(&jobs).await {
                Ok(outcome) => {
                    tracing::info!(
                        alerts_sent = outcome.alerts_sent(),
                        "scheduler: keyword alerts run complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: keyword alerts run failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered keyword alerts job");
    Ok(())
}
