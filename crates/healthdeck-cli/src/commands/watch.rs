use healthdeck_dashboard::{HealthDashboard, LoadOutcome};
use healthdeck_events::{Event, EventStream, NotificationLevel};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliResult};
use crate::output::render_dashboard;

/// Enter the health view and re-render after every applied refresh until Ctrl-C.
pub(crate) async fn handle_watch(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let dashboard = &ctx.dashboard;
    if let LoadOutcome::Failed { reason } = dashboard.init().await {
        eprintln!("initial load failed: {reason}; retrying on the next refresh");
    }
    // Events published while the first frame renders are replayed from here.
    let cursor = dashboard.context().events.last_event_id().unwrap_or(0);
    render(dashboard, format).await?;

    let events = dashboard.context().events.subscribe(Some(cursor));
    let result = tokio::select! {
        result = follow(dashboard, events, format) => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    dashboard.shutdown();
    result
}

async fn follow(
    dashboard: &HealthDashboard,
    mut events: EventStream,
    format: OutputFormat,
) -> CliResult<()> {
    while let Some(envelope) = events.next().await {
        debug!(id = envelope.id, kind = envelope.event.kind(), "dashboard event");
        match envelope.event {
            Event::MatrixRefreshed { .. } => render(dashboard, format).await?,
            Event::Notification {
                level: NotificationLevel::Error,
                message,
            } => eprintln!("{message}"),
            _ => {}
        }
    }
    Ok(())
}

async fn render(dashboard: &HealthDashboard, format: OutputFormat) -> CliResult<()> {
    let snapshot = dashboard.snapshot().await;
    if format == OutputFormat::Table {
        println!();
    }
    render_dashboard(&snapshot, &dashboard.config().tracked_models, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CliDependencies;
    use healthdeck_config::DashboardConfig;
    use healthdeck_dashboard::Tab;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn follow_renders_refreshes_until_interrupted() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/health/matrix");
            then.status(200)
                .json_body(json!({ "matrix": { "accounts": [{ "email": "ops@example.com" }] } }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/issues");
            then.status(200).json_body(json!({}));
        });

        let config = DashboardConfig {
            base_url: server.base_url().parse().expect("mock url"),
            ..DashboardConfig::default()
        };
        let deps = CliDependencies::from_config(&config, "trace-watch").expect("deps");
        let ctx = AppContext::build(config, &deps, None, Tab::Health).expect("context");

        let events = ctx.dashboard.context().events.subscribe(None);
        let _ = ctx.dashboard.load_matrix(true).await;
        let snapshot = ctx.dashboard.snapshot().await;
        assert_eq!(snapshot.rows.len(), 1);

        let outcome = timeout(
            Duration::from_millis(200),
            follow(&ctx.dashboard, events, OutputFormat::Json),
        )
        .await;
        assert!(outcome.is_err(), "follow keeps running until interrupted");
        assert_eq!(deps.metrics.snapshot().matrix_loads_applied, 1);
    }

    #[tokio::test]
    async fn refresh_during_first_render_is_replayed() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/health/matrix");
            then.status(200)
                .json_body(json!({ "matrix": { "accounts": [{ "email": "ops@example.com" }] } }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/issues");
            then.status(200).json_body(json!({ "issues": [] }));
        });

        let config = DashboardConfig {
            base_url: server.base_url().parse().expect("mock url"),
            ..DashboardConfig::default()
        };
        let deps = CliDependencies::from_config(&config, "trace-replay").expect("deps");
        let ctx = AppContext::build(config, &deps, None, Tab::Health).expect("context");
        let bus = &ctx.dashboard.context().events;

        let _ = ctx.dashboard.load_matrix(true).await;
        let cursor = bus.last_event_id().unwrap_or(0);
        let _ = ctx.dashboard.load_matrix(true).await;

        let mut events = bus.subscribe(Some(cursor));
        let envelope = timeout(Duration::from_secs(1), events.next())
            .await
            .expect("backlog delivered")
            .expect("stream open");
        assert_eq!(envelope.id, cursor + 1);
        assert!(matches!(envelope.event, Event::MatrixRefreshed { accounts: 1, .. }));
    }
}
