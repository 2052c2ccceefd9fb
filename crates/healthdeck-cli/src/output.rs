//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use healthdeck_dashboard::{
    AccountRow, CellTone, DashboardSnapshot, HealthCategory, HealthCell, Issue, Summary,
    format_score,
};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Placeholder shown for cells outside the active filter.
pub(crate) const DIMMED_CELL: &str = "·";

pub(crate) fn render_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_dashboard(
    snapshot: &DashboardSnapshot,
    models: &[String],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(snapshot)?,
        OutputFormat::Table => {
            println!("{}", summary_line(&snapshot.summary, snapshot.filter.active()));
            print!("{}", matrix_table(snapshot, models));
            if !snapshot.issues.is_empty() {
                println!();
                print!("{}", issues_table(&snapshot.issues));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_issues(issues: &[Issue], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(&issues)?,
        OutputFormat::Table => {
            if issues.is_empty() {
                println!("no active issues");
            } else {
                print!("{}", issues_table(issues));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_account(row: &AccountRow, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(row)?,
        OutputFormat::Table => print!("{}", account_table(row)),
    }
    Ok(())
}

pub(crate) fn summary_line(summary: &Summary, filter: Option<HealthCategory>) -> String {
    let mut line = HealthCategory::ALL
        .iter()
        .map(|category| format!("{category}: {}", summary.count(*category)))
        .collect::<Vec<_>>()
        .join("  ");
    if let Some(filter) = filter {
        let _ = write!(line, "  [filter: {filter}]");
    }
    line
}

pub(crate) fn matrix_table(snapshot: &DashboardSnapshot, models: &[String]) -> String {
    let mut header = vec!["ACCOUNT".to_string()];
    header.extend(models.iter().cloned());

    let mut rows = vec![header];
    for row in &snapshot.rows {
        let mut cells = vec![row.account.clone()];
        cells.extend(row.models.iter().map(|cell| {
            if snapshot.is_dimmed(cell) {
                DIMMED_CELL.to_string()
            } else {
                cell_label(cell)
            }
        }));
        rows.push(cells);
    }

    if snapshot.rows.is_empty() {
        let mut out = layout(&rows);
        out.push_str("no accounts reported\n");
        return out;
    }
    layout(&rows)
}

pub(crate) fn issues_table(issues: &[Issue]) -> String {
    let mut rows = vec![vec![
        "ISSUE".to_string(),
        "STATUS".to_string(),
        "DETAILS".to_string(),
    ]];
    for issue in issues {
        let details = if issue.details.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&issue.details).unwrap_or_default()
        };
        rows.push(vec![issue.id.clone(), issue.status.clone(), details]);
    }
    layout(&rows)
}

pub(crate) fn account_table(row: &AccountRow) -> String {
    let mut out = format!("account: {}\n", row.account);
    let mut rows = vec![vec![
        "MODEL".to_string(),
        "SCORE".to_string(),
        "OK".to_string(),
        "FAIL".to_string(),
        "STATE".to_string(),
    ]];
    for cell in &row.models {
        rows.push(vec![
            cell.model_id.clone(),
            format_score(cell.health_score),
            cell.success_count.to_string(),
            cell.fail_count.to_string(),
            tone_label(cell.tone()).to_string(),
        ]);
    }
    out.push_str(&layout(&rows));
    out
}

/// Score text, or the disabled reason for disabled cells.
pub(crate) fn cell_label(cell: &HealthCell) -> String {
    match cell.tone() {
        CellTone::QuotaDisabled => "quota".to_string(),
        CellTone::Disabled => "off".to_string(),
        CellTone::Healthy | CellTone::Warning | CellTone::Critical => {
            format_score(cell.health_score)
        }
    }
}

const fn tone_label(tone: CellTone) -> &'static str {
    match tone {
        CellTone::QuotaDisabled => "quota-disabled",
        CellTone::Disabled => "disabled",
        CellTone::Healthy => "healthy",
        CellTone::Warning => "warning",
        CellTone::Critical => "critical",
    }
}

/// Left-align columns to the widest entry, two spaces apart.
fn layout(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|index| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthdeck_dashboard::FilterState;
    use serde_json::json;

    fn cell(model: &str, score: f64, disabled: bool, quota_disabled: bool) -> HealthCell {
        HealthCell {
            model_id: model.into(),
            health_score: Some(score),
            success_count: 3,
            fail_count: 1,
            disabled,
            quota_disabled,
        }
    }

    fn snapshot(filter: Option<HealthCategory>) -> DashboardSnapshot {
        let rows = vec![AccountRow {
            account: "ops@example.com".into(),
            models: vec![
                cell("alpha", 95.0, false, false),
                cell("beta", 72.4, false, false),
                cell("gamma", 100.0, false, true),
            ],
        }];
        let mut state = FilterState::default();
        if let Some(category) = filter {
            state.toggle(category);
        }
        DashboardSnapshot {
            summary: Summary::from_rows(&rows),
            rows,
            issues: Vec::new(),
            filter: state,
            loading: false,
        }
    }

    fn models() -> Vec<String> {
        vec!["alpha".into(), "beta".into(), "gamma".into()]
    }

    #[test]
    fn matrix_table_aligns_columns_and_labels_cells() {
        let table = matrix_table(&snapshot(None), &models());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "ACCOUNT          alpha  beta  gamma");
        assert_eq!(lines[1], "ops@example.com  95%    72%   quota");
    }

    #[test]
    fn filtered_matrix_dims_other_categories() {
        let table = matrix_table(&snapshot(Some(HealthCategory::Warning)), &models());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[1], "ops@example.com  ·      72%   ·");
    }

    #[test]
    fn summary_line_lists_every_bucket_and_filter() {
        let snap = snapshot(Some(HealthCategory::Disabled));
        assert_eq!(
            summary_line(&snap.summary, snap.filter.active()),
            "healthy: 1  warning: 1  critical: 0  disabled: 1  [filter: disabled]"
        );
    }

    #[test]
    fn empty_matrix_says_so() {
        let table = matrix_table(&DashboardSnapshot::default(), &models());
        assert!(table.ends_with("no accounts reported\n"));
    }

    #[test]
    fn issues_table_includes_details() {
        let issue: Issue = serde_json::from_value(json!({
            "id": "i-1", "status": "active", "title": "quota exhausted"
        }))
        .expect("issue");
        let table = issues_table(&[issue]);
        let lines: Vec<_> = table.lines().collect();
        assert!(lines[0].starts_with("ISSUE"));
        assert!(lines[1].starts_with("i-1"));
        assert!(lines[1].contains("\"title\":\"quota exhausted\""));
    }

    #[test]
    fn account_table_shows_counts_and_state() {
        let snap = snapshot(None);
        let table = account_table(&snap.rows[0]);
        assert!(table.starts_with("account: ops@example.com\n"));
        assert!(table.contains("gamma  100%"));
        assert!(table.contains("quota-disabled"));
    }
}
