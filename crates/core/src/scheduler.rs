//! Background jobs.

use std::time::Duration;

use chrono::NaiveDate;
use gad_common::config::SchedulerConfig;
use tokio::{task::JoinHandle, time::interval};

use crate::services::AcademicPeriodService;

/// Archive periods that ended before `today`. Returns how many were archived.
pub async fn run_archive_sweep(service: &AcademicPeriodService, today: NaiveDate) -> usize {
    match service.archive_expired(today).await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(count, %today, "Archived expired academic periods");
            }
            count
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to archive expired academic periods");
            0
        }
    }
}

/// Spawn the periodic archival sweep. The first sweep runs immediately.
pub fn spawn_archive_scheduler(
    service: AcademicPeriodService,
    config: SchedulerConfig,
) -> JoinHandle<()> {
    let period = Duration::from_secs(config.archive_interval_secs.max(1));

    tokio::spawn(async move {
        let mut interval = interval(period);
        loop {
            interval.tick().await;
            run_archive_sweep(&service, config.today()).await;
        }
    })
}
