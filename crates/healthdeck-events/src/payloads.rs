//! Event payloads exchanged between dashboard components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to each event published on the bus.
pub type EventId = u64;

/// Typed signals crossing component boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Ask the account detail surface to open an account on a given tab.
    OpenAccountDetails {
        /// Account identifier (email).
        email: String,
        /// Tab to focus once the detail view is open.
        tab: DetailTab,
    },
    /// User-visible toast.
    Notification {
        /// Severity used for styling.
        level: NotificationLevel,
        /// Message text.
        message: String,
    },
    /// A matrix load was applied to dashboard state.
    MatrixRefreshed {
        /// Number of account rows now held.
        accounts: usize,
        /// Number of cells across all rows.
        cells: usize,
    },
    /// An issue was resolved and dropped from the local list.
    IssueResolved {
        /// Identifier of the resolved issue.
        id: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for log fields and filters.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OpenAccountDetails { .. } => "open_account_details",
            Self::Notification { .. } => "notification",
            Self::MatrixRefreshed { .. } => "matrix_refreshed",
            Self::IssueResolved { .. } => "issue_resolved",
        }
    }
}

/// Tabs of the account detail surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetailTab {
    /// Overview tab.
    Overview,
    /// Per-model health tab.
    Health,
}

/// Toast severities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// Metadata wrapper tracking the event id and emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Payload.
    pub event: Event,
}
