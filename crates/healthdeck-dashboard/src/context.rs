//! Shared collaborators handed to the dashboard at construction.
//!
//! # Design
//! - Each store is a cheap clone over a `tokio::sync::watch` channel or an
//!   atomic, so the CLI, the poll task and tests observe the same values.
//! - `TabStore` only notifies on real changes; setting the current tab again
//!   is a no-op for subscribers.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use healthdeck_events::EventBus;
use healthdeck_telemetry::Metrics;
use serde::Serialize;
use tokio::sync::watch;

/// Credential shared by every request the dashboard issues.
#[derive(Clone)]
pub struct CredentialStore {
    sender: Arc<watch::Sender<Option<String>>>,
}

impl CredentialStore {
    /// Store seeded with `initial`.
    #[must_use]
    pub fn new(initial: Option<String>) -> Self {
        Self {
            sender: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// Current credential, if one is set.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.sender.borrow().clone()
    }

    /// Replace the credential.
    pub fn set(&self, credential: Option<String>) {
        self.sender.send_replace(credential);
    }

    /// Persist a credential returned by the request helper. `None` keeps the
    /// current value. Returns whether a rotation was applied.
    pub fn apply_rotation(&self, rotated: Option<String>) -> bool {
        let Some(credential) = rotated else {
            return false;
        };
        self.sender.send_replace(Some(credential));
        true
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CredentialStore")
            .field("set", &self.sender.borrow().is_some())
            .finish()
    }
}

/// Top-level views of the surrounding application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// Landing view.
    #[default]
    Dashboard,
    /// Account list and detail surface.
    Accounts,
    /// Health matrix.
    Health,
    /// Settings.
    Settings,
}

/// Active tab, observable by the dashboard's poll lifecycle.
#[derive(Debug, Clone)]
pub struct TabStore {
    sender: Arc<watch::Sender<Tab>>,
}

impl TabStore {
    /// Store with `initial` selected.
    #[must_use]
    pub fn new(initial: Tab) -> Self {
        Self {
            sender: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// Currently selected tab.
    #[must_use]
    pub fn active(&self) -> Tab {
        *self.sender.borrow()
    }

    /// Select `tab`. Subscribers are notified only when the value changes.
    pub fn set(&self, tab: Tab) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == tab {
                false
            } else {
                *current = tab;
                true
            }
        })
    }

    /// Watch for tab changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Tab> {
        self.sender.subscribe()
    }
}

impl Default for TabStore {
    fn default() -> Self {
        Self::new(Tab::default())
    }
}

/// Whether the hosting surface is currently shown to the operator.
#[derive(Debug, Clone)]
pub struct Visibility {
    visible: Arc<AtomicBool>,
}

impl Visibility {
    /// Flag starting at `visible`.
    #[must_use]
    pub fn new(visible: bool) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(visible)),
        }
    }

    /// Current visibility.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Update visibility.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Everything the dashboard shares with the rest of the application.
#[derive(Clone, Default)]
pub struct DashboardContext {
    /// Credential attached to every request.
    pub credentials: CredentialStore,
    /// Active tab; drives the poll lifecycle.
    pub tabs: TabStore,
    /// Hidden surfaces skip poll ticks.
    pub visibility: Visibility,
    /// Bus for notifications and navigation.
    pub events: EventBus,
    /// Optional counters for load and resolve outcomes.
    pub metrics: Option<Metrics>,
}

impl DashboardContext {
    /// Attach a metrics registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub(crate) fn record(&self, apply: impl FnOnce(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            apply(metrics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_replaces_only_when_present() {
        let store = CredentialStore::new(Some("old".into()));
        assert!(!store.apply_rotation(None));
        assert_eq!(store.current().as_deref(), Some("old"));
        assert!(store.apply_rotation(Some("new".into())));
        assert_eq!(store.current().as_deref(), Some("new"));
        assert!(format!("{store:?}").contains("set: true"));
    }

    #[tokio::test]
    async fn tab_store_notifies_only_on_change() {
        let tabs = TabStore::new(Tab::Health);
        let mut receiver = tabs.subscribe();

        assert!(!tabs.set(Tab::Health));
        assert!(!receiver.has_changed().expect("sender alive"));

        assert!(tabs.set(Tab::Accounts));
        assert!(receiver.has_changed().expect("sender alive"));
        assert_eq!(*receiver.borrow_and_update(), Tab::Accounts);
        assert_eq!(tabs.active(), Tab::Accounts);
    }

    #[test]
    fn visibility_is_shared_between_clones() {
        let visibility = Visibility::default();
        let clone = visibility.clone();
        clone.set_visible(false);
        assert!(!visibility.is_visible());
    }
}
