//! Health matrix state, issue list, and the polling lifecycle.
//!
//! # Design
//! - `HealthDashboard` is a cheap clone over `Arc<Inner>`; background tasks
//!   hold a `Weak` so dropping the last handle stops them.
//! - State sits behind an async `RwLock` that is never held across a network
//!   await; each mutation happens between suspension points.
//! - Matrix loads are ticketed. A response older than the last applied one is
//!   discarded instead of overwriting newer data.
//! - Failures never escape: public operations log them and return outcome values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use healthdeck_config::{ConfigResult, DashboardConfig};
use healthdeck_events::{DetailTab, Event, NotificationLevel};
use healthdeck_telemetry::Metrics;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::{DashboardContext, Tab};
use crate::error::DashboardError;
use crate::filter::FilterState;
use crate::model::{AccountRow, HealthCategory, HealthCell, Issue, Summary, build_matrix};
use crate::poller;
use crate::transport::HealthApi;

/// Toast shown after an issue is resolved.
pub const ISSUE_RESOLVED_MESSAGE: &str = "Issue resolved";
/// Toast shown when resolving an issue fails.
pub const ISSUE_RESOLVE_FAILED_MESSAGE: &str = "Failed to resolve issue";

/// Result of a matrix load.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum LoadOutcome {
    /// The response replaced the held rows and summary.
    Applied {
        /// Account rows now held.
        accounts: usize,
        /// Cells across all rows.
        cells: usize,
    },
    /// A newer load had already been applied; the response was dropped.
    Stale,
    /// The request failed; previous rows are kept.
    Failed {
        /// Short description for display.
        reason: String,
    },
}

impl LoadOutcome {
    /// Metric label for this outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Stale => "stale",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of an issue list load.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum IssuesOutcome {
    /// Active issues replaced the held list.
    Loaded {
        /// Number of active issues held.
        active: usize,
    },
    /// The request failed and the list was emptied.
    Cleared {
        /// Short description for display.
        reason: String,
    },
}

/// Result of a resolve request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ResolveOutcome {
    /// The issue was resolved and dropped from the list.
    Resolved,
    /// The request failed; the list is unchanged.
    Failed {
        /// Short description for display.
        reason: String,
    },
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Rows in server order.
    pub rows: Vec<AccountRow>,
    /// Category counts over `rows`.
    pub summary: Summary,
    /// Active issues in server order.
    pub issues: Vec<Issue>,
    /// Highlighted category.
    pub filter: FilterState,
    /// Whether a non-silent matrix load is in flight.
    pub loading: bool,
}

impl DashboardSnapshot {
    /// Whether `cell` should be rendered dimmed under the current filter.
    #[must_use]
    pub fn is_dimmed(&self, cell: &HealthCell) -> bool {
        self.filter.is_dimmed(cell)
    }
}

#[derive(Default)]
struct DashboardState {
    rows: Vec<AccountRow>,
    summary: Summary,
    issues: Vec<Issue>,
    filter: FilterState,
    loading_ticket: Option<u64>,
    applied_ticket: u64,
}

struct Inner {
    config: DashboardConfig,
    api: Arc<dyn HealthApi>,
    context: DashboardContext,
    state: RwLock<DashboardState>,
    next_ticket: AtomicU64,
    poller: Mutex<Option<JoinHandle<()>>>,
    tab_watcher: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for slot in [&mut self.poller, &mut self.tab_watcher] {
            let handle = slot.get_mut().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(handle) = handle {
                handle.abort();
            }
        }
    }
}

/// Client-side view over the health service.
#[derive(Clone)]
pub struct HealthDashboard {
    inner: Arc<Inner>,
}

/// Non-owning handle used by background tasks.
#[derive(Clone)]
pub(crate) struct WeakDashboard {
    inner: Weak<Inner>,
}

impl WeakDashboard {
    pub(crate) fn upgrade(&self) -> Option<HealthDashboard> {
        self.inner.upgrade().map(|inner| HealthDashboard { inner })
    }
}

impl HealthDashboard {
    /// Build a dashboard. No request is issued until [`Self::init`] runs.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(
        config: DashboardConfig,
        api: Arc<dyn HealthApi>,
        context: DashboardContext,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                api,
                context,
                state: RwLock::new(DashboardState::default()),
                next_ticket: AtomicU64::new(0),
                poller: Mutex::new(None),
                tab_watcher: Mutex::new(None),
            }),
        })
    }

    /// Perform the initial load, start polling if the health view is active,
    /// and follow tab changes from then on.
    pub async fn init(&self) -> LoadOutcome {
        let receiver = self.inner.context.tabs.subscribe();
        let watcher = tokio::spawn(watch_tabs(self.downgrade(), receiver));
        if let Some(previous) = lock(&self.inner.tab_watcher).replace(watcher) {
            previous.abort();
        }

        let outcome = self.load_matrix(false).await;
        if self.inner.context.tabs.active() == Tab::Health {
            self.start_polling();
        }
        outcome
    }

    /// Stop polling and tab tracking.
    pub fn shutdown(&self) {
        self.stop_polling();
        if let Some(handle) = lock(&self.inner.tab_watcher).take() {
            handle.abort();
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Shared collaborators.
    #[must_use]
    pub fn context(&self) -> &DashboardContext {
        &self.inner.context
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let state = self.inner.state.read().await;
        DashboardSnapshot {
            rows: state.rows.clone(),
            summary: state.summary,
            issues: state.issues.clone(),
            filter: state.filter,
            loading: state.loading_ticket.is_some(),
        }
    }

    /// Fetch the matrix for the tracked models, then refresh issues.
    ///
    /// `silent` loads leave the loading flag untouched. Failures keep the
    /// previously held rows.
    pub async fn load_matrix(&self, silent: bool) -> LoadOutcome {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        if !silent {
            self.inner.state.write().await.loading_ticket = Some(ticket);
        }

        let models = self.inner.config.models_query();
        let reply = self
            .inner
            .api
            .fetch_matrix(&models, self.inner.context.credentials.current())
            .await;
        self.apply_rotation(reply.rotated_credential);

        let outcome = match reply.outcome {
            Ok(response) => {
                let rows = build_matrix(&self.inner.config.tracked_models, &response);
                let summary = Summary::from_rows(&rows);
                let mut state = self.inner.state.write().await;
                clear_loading(&mut state, ticket);
                if ticket < state.applied_ticket {
                    debug!(
                        ticket,
                        applied = state.applied_ticket,
                        "discarding stale matrix response"
                    );
                    LoadOutcome::Stale
                } else {
                    let accounts = rows.len();
                    let cells = summary.total();
                    state.rows = rows;
                    state.summary = summary;
                    state.applied_ticket = ticket;
                    drop(state);
                    self.publish_refresh(summary, accounts, cells);
                    LoadOutcome::Applied { accounts, cells }
                }
            }
            Err(err) => {
                clear_loading(&mut *self.inner.state.write().await, ticket);
                warn!(
                    operation = err.operation(),
                    error = %err,
                    status = ?err.status(),
                    silent,
                    "matrix load failed"
                );
                LoadOutcome::Failed {
                    reason: failure_reason(&err),
                }
            }
        };
        let label = outcome.label();
        self.record(|metrics| metrics.inc_matrix_load(label));

        let _ = self.load_issues(silent).await;
        outcome
    }

    /// Replace the issue list with the active issues, or empty it on failure.
    pub async fn load_issues(&self, silent: bool) -> IssuesOutcome {
        let reply = self
            .inner
            .api
            .fetch_issues(self.inner.context.credentials.current())
            .await;
        self.apply_rotation(reply.rotated_credential);

        match reply.outcome {
            Ok(response) => {
                let issues = response.into_active();
                let active = issues.len();
                self.inner.state.write().await.issues = issues;
                self.record(|metrics| metrics.inc_issue_load("loaded"));
                IssuesOutcome::Loaded { active }
            }
            Err(err) => {
                self.inner.state.write().await.issues.clear();
                if err.status() == Some(StatusCode::NOT_FOUND) {
                    debug!(silent, "issue endpoint not available");
                } else {
                    warn!(
                        operation = err.operation(),
                        error = %err,
                        status = ?err.status(),
                        silent,
                        "issue load failed"
                    );
                }
                self.record(|metrics| metrics.inc_issue_load("degraded"));
                IssuesOutcome::Cleared {
                    reason: failure_reason(&err),
                }
            }
        }
    }

    /// Resolve one issue and drop it from the local list on success.
    pub async fn resolve_issue(&self, id: &str) -> ResolveOutcome {
        let reply = self
            .inner
            .api
            .resolve_issue(id, self.inner.context.credentials.current())
            .await;
        self.apply_rotation(reply.rotated_credential);

        match reply.outcome {
            Ok(()) => {
                self.inner
                    .state
                    .write()
                    .await
                    .issues
                    .retain(|issue| issue.id != id);
                info!(issue_id = id, "issue resolved");
                self.notify(NotificationLevel::Success, ISSUE_RESOLVED_MESSAGE);
                self.inner
                    .context
                    .events
                    .publish(Event::IssueResolved { id: id.to_string() });
                self.record(|metrics| metrics.inc_issue_resolution("resolved"));
                ResolveOutcome::Resolved
            }
            Err(err) => {
                warn!(
                    issue_id = id,
                    operation = err.operation(),
                    error = %err,
                    status = ?err.status(),
                    "issue resolution failed"
                );
                self.notify(NotificationLevel::Error, ISSUE_RESOLVE_FAILED_MESSAGE);
                self.record(|metrics| metrics.inc_issue_resolution("failed"));
                ResolveOutcome::Failed {
                    reason: failure_reason(&err),
                }
            }
        }
    }

    /// Toggle the category filter; returns the filter now in effect.
    pub async fn set_filter(&self, category: HealthCategory) -> Option<HealthCategory> {
        let mut state = self.inner.state.write().await;
        state.filter.toggle(category);
        state.filter.active()
    }

    /// Switch to the accounts tab, then ask the detail surface to open
    /// `email` on its health tab once the navigation delay has passed.
    pub fn view_account_health(&self, email: impl Into<String>) -> JoinHandle<()> {
        let email = email.into();
        self.inner.context.tabs.set(Tab::Accounts);
        let events = self.inner.context.events.clone();
        let delay = self.inner.config.navigation_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(email = %email, "opening account details");
            events.publish(Event::OpenAccountDetails {
                email,
                tab: DetailTab::Health,
            });
        })
    }

    /// Start the background refresh loop, replacing any running one.
    pub fn start_polling(&self) {
        let handle = tokio::spawn(poller::run(
            self.downgrade(),
            self.inner.config.poll_interval,
        ));
        if let Some(previous) = lock(&self.inner.poller).replace(handle) {
            previous.abort();
        }
        debug!(
            interval_secs = self.inner.config.poll_interval.as_secs(),
            "polling started"
        );
    }

    /// Stop the background refresh loop. Returns whether one was running.
    pub fn stop_polling(&self) -> bool {
        let Some(handle) = lock(&self.inner.poller).take() else {
            return false;
        };
        handle.abort();
        debug!("polling stopped");
        true
    }

    /// Whether the refresh loop is running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub(crate) fn downgrade(&self) -> WeakDashboard {
        WeakDashboard {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn record(&self, apply: impl FnOnce(&Metrics)) {
        self.inner.context.record(apply);
    }

    fn apply_rotation(&self, rotated: Option<String>) {
        if self.inner.context.credentials.apply_rotation(rotated) {
            info!("credential rotated");
            self.record(Metrics::inc_credential_rotation);
        }
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        self.inner.context.events.publish(Event::Notification {
            level,
            message: message.to_string(),
        });
    }

    fn publish_refresh(&self, summary: Summary, accounts: usize, cells: usize) {
        self.record(|metrics| {
            for category in HealthCategory::ALL {
                metrics.set_health_cells(category.as_str(), summary.count(category));
            }
        });
        self.inner
            .context
            .events
            .publish(Event::MatrixRefreshed { accounts, cells });
    }
}

async fn watch_tabs(dashboard: WeakDashboard, mut receiver: watch::Receiver<Tab>) {
    while receiver.changed().await.is_ok() {
        let tab = *receiver.borrow_and_update();
        let Some(dashboard) = dashboard.upgrade() else {
            break;
        };
        if tab == Tab::Health {
            let _ = dashboard.load_matrix(false).await;
            dashboard.start_polling();
        } else {
            dashboard.stop_polling();
        }
    }
}

fn clear_loading(state: &mut DashboardState, ticket: u64) {
    if state.loading_ticket == Some(ticket) {
        state.loading_ticket = None;
    }
}

fn failure_reason(err: &DashboardError) -> String {
    err.status()
        .map_or_else(|| err.to_string(), |status| format!("{err} ({status})"))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
