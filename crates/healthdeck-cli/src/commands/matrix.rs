use std::time::Duration;

use anyhow::anyhow;
use healthdeck_dashboard::{IssuesOutcome, LoadOutcome, ResolveOutcome};
use healthdeck_events::Event;
use tokio::time::timeout;

use crate::cli::{AccountArgs, MatrixArgs, OutputFormat, ResolveArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_account, render_dashboard, render_issues};

const NAVIGATION_WAIT: Duration = Duration::from_secs(2);

pub(crate) async fn handle_matrix(
    ctx: &AppContext,
    args: MatrixArgs,
    format: OutputFormat,
) -> CliResult<()> {
    load_matrix(ctx).await?;
    if let Some(category) = args.filter {
        let _ = ctx.dashboard.set_filter(category).await;
    }
    let snapshot = ctx.dashboard.snapshot().await;
    render_dashboard(&snapshot, &ctx.dashboard.config().tracked_models, format)
}

pub(crate) async fn handle_issues(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    if let IssuesOutcome::Cleared { reason } = ctx.dashboard.load_issues(false).await {
        eprintln!("issues unavailable: {reason}");
    }
    let snapshot = ctx.dashboard.snapshot().await;
    render_issues(&snapshot.issues, format)
}

pub(crate) async fn handle_resolve(ctx: &AppContext, args: ResolveArgs) -> CliResult<()> {
    let id = args.id.trim();
    if id.is_empty() {
        return Err(CliError::validation("issue id must not be empty"));
    }
    match ctx.dashboard.resolve_issue(id).await {
        ResolveOutcome::Resolved => {
            println!("issue {id} resolved");
            Ok(())
        }
        ResolveOutcome::Failed { reason } => Err(CliError::failure(anyhow!(
            "failed to resolve issue {id}: {reason}"
        ))),
    }
}

pub(crate) async fn handle_account(
    ctx: &AppContext,
    args: AccountArgs,
    format: OutputFormat,
) -> CliResult<()> {
    load_matrix(ctx).await?;

    let mut events = ctx.dashboard.context().events.subscribe(None);
    let navigation = ctx.dashboard.view_account_health(args.email.clone());
    navigation
        .await
        .map_err(|err| CliError::failure(anyhow!("navigation task failed: {err}")))?;

    let email = timeout(NAVIGATION_WAIT, async {
        while let Some(envelope) = events.next().await {
            if let Event::OpenAccountDetails { email, .. } = envelope.event {
                return Some(email);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
    .ok_or_else(|| CliError::failure(anyhow!("account details were not requested")))?;

    let snapshot = ctx.dashboard.snapshot().await;
    let row = snapshot
        .rows
        .iter()
        .find(|row| row.account == email)
        .ok_or_else(|| CliError::validation(format!("account '{email}' is not in the health matrix")))?;
    render_account(row, format)
}

async fn load_matrix(ctx: &AppContext) -> CliResult<()> {
    match ctx.dashboard.load_matrix(false).await {
        LoadOutcome::Failed { reason } => Err(CliError::failure(anyhow!(
            "failed to load health matrix: {reason}"
        ))),
        LoadOutcome::Applied { .. } | LoadOutcome::Stale => Ok(()),
    }
}
