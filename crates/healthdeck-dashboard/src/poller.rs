//! Background refresh loop driven by a fixed interval.

use std::time::Duration;

use healthdeck_telemetry::Metrics;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::dashboard::{LoadOutcome, WeakDashboard};

/// Refresh silently every `period` until the dashboard is dropped or the task
/// is aborted. The first refresh happens one full period after start; ticks
/// that land while the surface is hidden are skipped.
pub(crate) async fn run(dashboard: WeakDashboard, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(dashboard) = dashboard.upgrade() else {
            break;
        };
        if !dashboard.context().visibility.is_visible() {
            debug!("surface hidden; skipping poll tick");
            dashboard.record(Metrics::inc_poll_tick_skipped);
            continue;
        }
        if let LoadOutcome::Failed { reason } = dashboard.load_matrix(true).await {
            warn!(reason = %reason, "background refresh failed");
        }
    }
}
