//! Periodic repair of cached `total_steps` counters.
//!
//! Counter writes that fail after a step insert or delete are only logged, so
//! the cached value can drift from the real row count. This job scans every
//! tour on a fixed interval and rewrites the drifted counters.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tourflow_db::lifecycle::TourLifecycle;

/// Run the reconciliation loop until `cancel` is triggered.
pub async fn run(tours: TourLifecycle, period: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = period.as_secs(),
        "Step count reconciliation job started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Step count reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                match tours.reconcile_all().await {
                    Ok(repaired) if repaired.is_empty() => {
                        tracing::debug!("Step count reconciliation: no drift");
                    }
                    Ok(repaired) => {
                        for drift in &repaired {
                            tracing::info!(
                                tour_id = drift.tour_id,
                                cached = drift.cached,
                                actual = drift.actual,
                                "Step count reconciliation: repaired counter"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Step count reconciliation: scan failed");
                    }
                }
            }
        }
    }
}
