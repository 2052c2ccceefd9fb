#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the health monitoring API.
//!
//! The dashboard and the CLI decode responses through these types so the
//! contract with the remote service lives in one place. Absent collections are
//! tolerated everywhere: the service omits `matrix`, `accounts`, `models` and
//! `issues` when it has nothing to report.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path of the per-account/per-model health matrix endpoint.
pub const MATRIX_PATH: &str = "/api/health/matrix";
/// Path of the issue listing endpoint.
pub const ISSUES_PATH: &str = "/api/issues";
/// Query parameter carrying the comma-joined tracked model identifiers.
pub const MODELS_QUERY_PARAM: &str = "models";
/// Issue status value that marks an unresolved issue.
pub const ISSUE_STATUS_ACTIVE: &str = "active";

/// Build the resolve path for a single issue, percent-encoding the identifier.
#[must_use]
pub fn resolve_issue_path(id: &str) -> String {
    format!("{ISSUES_PATH}/{}/resolve", urlencoding::encode(id))
}

/// Envelope returned by `GET /api/health/matrix`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatrixResponse {
    #[serde(default)]
    /// Matrix payload; missing or `null` is treated as an empty matrix.
    pub matrix: Option<MatrixPayload>,
}

impl MatrixResponse {
    /// Accounts reported by the service, empty when the payload was omitted.
    #[must_use]
    pub fn accounts(&self) -> &[AccountHealthEntry] {
        self.matrix
            .as_ref()
            .and_then(|matrix| matrix.accounts.as_deref())
            .unwrap_or_default()
    }
}

/// Matrix body keyed by account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatrixPayload {
    #[serde(default)]
    /// Per-account entries in server order.
    pub accounts: Option<Vec<AccountHealthEntry>>,
}

/// Health statistics for one account across the requested models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountHealthEntry {
    /// Account identifier (usually an email address).
    pub email: String,
    #[serde(default)]
    /// Statistics keyed by model identifier; models without data are omitted
    /// or sent as `null`.
    pub models: Option<HashMap<String, Option<ModelHealthStats>>>,
}

impl AccountHealthEntry {
    /// Statistics reported for `model_id`, if any.
    #[must_use]
    pub fn model(&self, model_id: &str) -> Option<&ModelHealthStats> {
        self.models
            .as_ref()
            .and_then(|models| models.get(model_id))
            .and_then(Option::as_ref)
    }
}

/// Raw statistics for one (account, model) pair.
///
/// Every field may be omitted or `null`; consumers pick the fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelHealthStats {
    #[serde(default)]
    /// Reliability score in `0..=100`; the service may omit it.
    pub health_score: Option<f64>,
    #[serde(default)]
    /// Successful requests observed.
    pub success_count: Option<u64>,
    #[serde(default)]
    /// Failed requests observed.
    pub fail_count: Option<u64>,
    #[serde(default)]
    /// Disabled after repeated failures.
    pub disabled: Option<bool>,
    #[serde(default)]
    /// Disabled because the quota was exhausted.
    pub quota_disabled: Option<bool>,
}

/// Envelope returned by `GET /api/issues`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssuesResponse {
    #[serde(default)]
    /// Issues in server order, regardless of status.
    pub issues: Option<Vec<IssueEntry>>,
}

impl IssuesResponse {
    /// Consume the envelope and keep only issues whose status is `active`.
    #[must_use]
    pub fn into_active(self) -> Vec<IssueEntry> {
        self.issues
            .unwrap_or_default()
            .into_iter()
            .filter(IssueEntry::is_active)
            .collect()
    }
}

/// Issue record as reported by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueEntry {
    /// Issue identifier used by the resolve endpoint.
    pub id: String,
    #[serde(default)]
    /// Lifecycle status (`active`, `resolved`, ...).
    pub status: String,
    #[serde(flatten)]
    /// Remaining fields, kept opaque for display.
    pub details: Map<String, Value>,
}

impl IssueEntry {
    /// Whether the issue still needs operator action.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ISSUE_STATUS_ACTIVE
    }
}
