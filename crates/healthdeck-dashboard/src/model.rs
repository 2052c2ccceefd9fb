//! Matrix rows, cell classification, and summary counts.
//!
//! # Design
//! - Rows are rebuilt from scratch on every load; nothing here is mutated in place.
//! - Classification is a pure function of one cell so the summary, the filter
//!   lens and the renderers can never disagree.

use std::fmt;
use std::str::FromStr;

use healthdeck_api_models::{MatrixResponse, ModelHealthStats};
use serde::Serialize;

pub use healthdeck_api_models::IssueEntry as Issue;

/// Score at or above which a cell is healthy.
pub const HEALTHY_THRESHOLD: f64 = 90.0;
/// Score at or above which a cell is a warning (below [`HEALTHY_THRESHOLD`]).
pub const WARNING_THRESHOLD: f64 = 70.0;
/// Score assumed when the service reports nothing for a cell.
pub const DEFAULT_HEALTH_SCORE: f64 = 100.0;

/// Health of one (account, model) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCell {
    /// Model identifier this cell belongs to.
    pub model_id: String,
    /// Reliability score; `None` when the service sent a cell without one.
    pub health_score: Option<f64>,
    /// Successful requests observed.
    pub success_count: u64,
    /// Failed requests observed.
    pub fail_count: u64,
    /// Disabled after repeated failures.
    pub disabled: bool,
    /// Disabled because the quota was exhausted.
    pub quota_disabled: bool,
}

impl HealthCell {
    /// Cell used when the service has no data for the pair.
    #[must_use]
    pub fn missing(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            health_score: Some(DEFAULT_HEALTH_SCORE),
            success_count: 0,
            fail_count: 0,
            disabled: false,
            quota_disabled: false,
        }
    }

    fn from_stats(model_id: &str, stats: &ModelHealthStats) -> Self {
        Self {
            model_id: model_id.to_string(),
            health_score: stats.health_score,
            success_count: stats.success_count.unwrap_or(0),
            fail_count: stats.fail_count.unwrap_or(0),
            disabled: stats.disabled.unwrap_or(false),
            quota_disabled: stats.quota_disabled.unwrap_or(false),
        }
    }

    /// Category of this cell.
    #[must_use]
    pub fn category(&self) -> HealthCategory {
        classify(self)
    }

    /// Visual tone of this cell.
    #[must_use]
    pub fn tone(&self) -> CellTone {
        tone(self)
    }
}

/// One account with a cell per tracked model, in tracked order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRow {
    /// Account identifier (usually an email address).
    pub account: String,
    /// Cells in tracked-model order.
    pub models: Vec<HealthCell>,
}

/// Buckets a cell can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    /// Score at or above 90.
    Healthy,
    /// Score at or above 70.
    Warning,
    /// Anything lower, including a missing score.
    Critical,
    /// Disabled for failures or quota.
    Disabled,
}

impl HealthCategory {
    /// Every category in display order.
    pub const ALL: [Self; 4] = [Self::Healthy, Self::Warning, Self::Critical, Self::Disabled];

    /// Lowercase name used on the wire, in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown health category")]
pub struct UnknownCategory {
    /// Value that failed to parse.
    pub value: String,
}

impl FromStr for HealthCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownCategory {
                value: value.to_string(),
            })
    }
}

/// Visual tone of a cell; finer than [`HealthCategory`] for disabled cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTone {
    /// Amber: disabled by quota exhaustion.
    QuotaDisabled,
    /// Red: disabled after failures.
    Disabled,
    /// Green.
    Healthy,
    /// Yellow.
    Warning,
    /// Red.
    Critical,
}

/// Classify a cell. Quota-disabled wins over disabled, then the score bands apply.
#[must_use]
pub fn classify(cell: &HealthCell) -> HealthCategory {
    if cell.quota_disabled || cell.disabled {
        return HealthCategory::Disabled;
    }
    match cell.health_score {
        Some(score) if score >= HEALTHY_THRESHOLD => HealthCategory::Healthy,
        Some(score) if score >= WARNING_THRESHOLD => HealthCategory::Warning,
        _ => HealthCategory::Critical,
    }
}

/// Tone for a cell, following the same priority as [`classify`].
#[must_use]
pub fn tone(cell: &HealthCell) -> CellTone {
    if cell.quota_disabled {
        return CellTone::QuotaDisabled;
    }
    if cell.disabled {
        return CellTone::Disabled;
    }
    match classify(cell) {
        HealthCategory::Healthy => CellTone::Healthy,
        HealthCategory::Warning => CellTone::Warning,
        HealthCategory::Critical | HealthCategory::Disabled => CellTone::Critical,
    }
}

/// Render a score as a rounded percentage, or `-` when absent.
#[must_use]
pub fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |value| format!("{:.0}%", value.round()))
}

/// Reshape a matrix response into rows, one cell per tracked model.
///
/// Accounts keep server order; cells follow `tracked_models`. Models the
/// service omitted for an account get [`HealthCell::missing`].
#[must_use]
pub fn build_matrix(tracked_models: &[String], response: &MatrixResponse) -> Vec<AccountRow> {
    response
        .accounts()
        .iter()
        .map(|entry| AccountRow {
            account: entry.email.clone(),
            models: tracked_models
                .iter()
                .map(|model_id| {
                    entry.model(model_id).map_or_else(
                        || HealthCell::missing(model_id),
                        |stats| HealthCell::from_stats(model_id, stats),
                    )
                })
                .collect(),
        })
        .collect()
}

/// Cell counts per category across every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Healthy cells.
    pub healthy: usize,
    /// Warning cells.
    pub warning: usize,
    /// Critical cells.
    pub critical: usize,
    /// Disabled cells (failures or quota).
    pub disabled: usize,
}

impl Summary {
    /// Fold every cell of `rows` into category counts.
    #[must_use]
    pub fn from_rows(rows: &[AccountRow]) -> Self {
        rows.iter()
            .flat_map(|row| row.models.iter())
            .fold(Self::default(), |mut summary, cell| {
                match classify(cell) {
                    HealthCategory::Healthy => summary.healthy += 1,
                    HealthCategory::Warning => summary.warning += 1,
                    HealthCategory::Critical => summary.critical += 1,
                    HealthCategory::Disabled => summary.disabled += 1,
                }
                summary
            })
    }

    /// Count for one category.
    #[must_use]
    pub const fn count(&self, category: HealthCategory) -> usize {
        match category {
            HealthCategory::Healthy => self.healthy,
            HealthCategory::Warning => self.warning,
            HealthCategory::Critical => self.critical,
            HealthCategory::Disabled => self.disabled,
        }
    }

    /// Total number of cells counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.healthy + self.warning + self.critical + self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cell(score: Option<f64>, disabled: bool, quota_disabled: bool) -> HealthCell {
        HealthCell {
            model_id: "m".into(),
            health_score: score,
            success_count: 0,
            fail_count: 0,
            disabled,
            quota_disabled,
        }
    }

    fn tracked() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into(), "d".into()]
    }

    #[test]
    fn classification_respects_priority_and_thresholds() {
        assert_eq!(classify(&cell(Some(100.0), false, true)), HealthCategory::Disabled);
        assert_eq!(classify(&cell(Some(100.0), true, false)), HealthCategory::Disabled);
        assert_eq!(classify(&cell(Some(90.0), false, false)), HealthCategory::Healthy);
        assert_eq!(classify(&cell(Some(89.99), false, false)), HealthCategory::Warning);
        assert_eq!(classify(&cell(Some(70.0), false, false)), HealthCategory::Warning);
        assert_eq!(classify(&cell(Some(69.9), false, false)), HealthCategory::Critical);
        assert_eq!(classify(&cell(None, false, false)), HealthCategory::Critical);
    }

    #[test]
    fn tones_separate_quota_from_failure() {
        assert_eq!(tone(&cell(Some(20.0), true, true)), CellTone::QuotaDisabled);
        assert_eq!(tone(&cell(Some(95.0), true, false)), CellTone::Disabled);
        assert_eq!(tone(&cell(Some(95.0), false, false)), CellTone::Healthy);
        assert_eq!(tone(&cell(Some(75.0), false, false)), CellTone::Warning);
        assert_eq!(tone(&cell(None, false, false)), CellTone::Critical);
    }

    #[test]
    fn missing_cells_default_to_healthy() {
        let response: MatrixResponse = serde_json::from_value(json!({
            "matrix": { "accounts": [
                { "email": "one@example.com", "models": {
                    "b": { "healthScore": 50, "successCount": 1, "failCount": 4, "disabled": false }
                } },
                { "email": "two@example.com" }
            ] }
        }))
        .expect("decode");

        let rows = build_matrix(&tracked(), &response);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account, "one@example.com");
        let ids: Vec<_> = rows[0].models.iter().map(|c| c.model_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(rows[0].models[0], HealthCell::missing("a"));
        assert_eq!(rows[0].models[1].health_score, Some(50.0));
        assert_eq!(rows[0].models[1].fail_count, 4);
        assert!(rows.iter().all(|row| row.models.len() == 4));
        assert_eq!(rows[1].models[3].category(), HealthCategory::Healthy);

        let summary = Summary::from_rows(&rows);
        assert_eq!(summary.total(), 8);
        assert_eq!(summary.healthy, 7);
        assert_eq!(summary.critical, 1);
    }

    #[test]
    fn null_cells_and_fields_fall_back_to_defaults() {
        let response: MatrixResponse = serde_json::from_value(json!({
            "matrix": { "accounts": [
                { "email": "one@example.com", "models": {
                    "a": null,
                    "b": { "healthScore": 95, "successCount": null, "failCount": null,
                           "disabled": null, "quotaDisabled": null }
                } }
            ] }
        }))
        .expect("null entries decode");

        let rows = build_matrix(&tracked(), &response);
        assert_eq!(rows[0].models[0], HealthCell::missing("a"));
        let b = &rows[0].models[1];
        assert_eq!(b.health_score, Some(95.0));
        assert_eq!((b.success_count, b.fail_count), (0, 0));
        assert!(!b.disabled && !b.quota_disabled);
        assert_eq!(Summary::from_rows(&rows).healthy, 4);
    }

    #[test]
    fn summary_counts_quota_disabled_as_disabled() {
        let rows = vec![AccountRow {
            account: "x".into(),
            models: vec![
                cell(Some(100.0), false, true),
                cell(Some(100.0), true, false),
                cell(Some(80.0), false, false),
            ],
        }];
        let summary = Summary::from_rows(&rows);
        assert_eq!(
            summary,
            Summary {
                healthy: 0,
                warning: 1,
                critical: 0,
                disabled: 2
            }
        );
        assert_eq!(summary.count(HealthCategory::Disabled), 2);
    }

    #[test]
    fn empty_response_yields_no_rows() {
        let rows = build_matrix(&tracked(), &MatrixResponse::default());
        assert!(rows.is_empty());
        assert_eq!(Summary::from_rows(&rows), Summary::default());
    }

    #[test]
    fn scores_format_as_rounded_percentages() {
        assert_eq!(format_score(None), "-");
        assert_eq!(format_score(Some(100.0)), "100%");
        assert_eq!(format_score(Some(72.5)), "73%");
        assert_eq!(format_score(Some(72.4)), "72%");
    }

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!("Warning".parse::<HealthCategory>(), Ok(HealthCategory::Warning));
        assert_eq!(" disabled ".parse::<HealthCategory>(), Ok(HealthCategory::Disabled));
        assert!("amber".parse::<HealthCategory>().is_err());
        assert_eq!(HealthCategory::Critical.to_string(), "critical");
    }
}
