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
#![allow(clippy::redundant_pub_crate)]

//! Client-side health dashboard for the account/model health service.
//!
//! Layout: `model.rs` (rows, cells, classification, summary), `filter.rs`
//! (category lens), `context.rs` (credential/tab/visibility stores),
//! `transport.rs` (`HealthApi` and its `reqwest` implementation),
//! `dashboard.rs` (`HealthDashboard` state and operations), `poller.rs`
//! (interval refresh loop), `error.rs` (`DashboardError`).

pub mod context;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod model;
mod poller;
pub mod transport;

pub use context::{CredentialStore, DashboardContext, Tab, TabStore, Visibility};
pub use dashboard::{
    DashboardSnapshot, HealthDashboard, ISSUE_RESOLVE_FAILED_MESSAGE, ISSUE_RESOLVED_MESSAGE,
    IssuesOutcome, LoadOutcome, ResolveOutcome,
};
pub use error::{DashboardError, DashboardResult};
pub use filter::FilterState;
pub use model::{
    AccountRow, CellTone, HealthCategory, HealthCell, Issue, Summary, build_matrix, classify,
    format_score, tone,
};
pub use transport::{ApiReply, CredentialPrompt, HEADER_PASSWORD, HealthApi, HttpHealthApi};
