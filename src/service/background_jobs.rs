// service/background_jobs.rs
use std::sync::Arc;

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc, Weekday};
use tokio::time::{interval, Duration};

use crate::AppState;

/// Monday to Sunday of the week before the one containing `today`.
pub fn previous_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let this_monday = today - ChronoDuration::days(today.weekday().num_days_from_monday() as i64);
    (
        this_monday - ChronoDuration::days(7),
        this_monday - ChronoDuration::days(1),
    )
}

/// Generates last week's payouts once every Monday. A week whose
/// instruction file could not be written is exported again on every tick
/// until it succeeds.
pub async fn start_weekly_payout_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(3600)); // hourly check
    let mut last_run: Option<NaiveDate> = None;
    let mut export_retry: Option<(NaiveDate, NaiveDate)> = None;

    loop {
        interval.tick().await;

        if let Some((week_start, week_end)) = export_retry {
            match app_state.payout_service.export_week(week_start, week_end).await {
                Ok(file_name) => {
                    tracing::info!(%week_start, %week_end, file = ?file_name, "Payout export retry succeeded");
                    export_retry = None;
                }
                Err(e) => tracing::error!(%week_start, %week_end, error = %e, "Payout export retry failed"),
            }
        }

        let today = Utc::now().date_naive();
        if today.weekday() != Weekday::Mon || last_run == Some(today) {
            continue;
        }

        let (week_start, week_end) = previous_week(today);
        tracing::info!("Running weekly payout job for {} to {}", week_start, week_end);

        match app_state
            .payout_service
            .generate_for_week(week_start, week_end)
            .await
        {
            Ok(report) => {
                last_run = Some(today);
                if report.file_error.is_some() {
                    export_retry = Some((week_start, week_end));
                }
                tracing::info!(
                    "Weekly payout job completed: {} created, {} skipped, {} failed, file {:?}",
                    report.created,
                    report.skipped,
                    report.failed,
                    report.file_name
                );
            }
            Err(e) => tracing::error!("Weekly payout job failed: {}", e),
        }
    }
}
