//! Typed configuration models.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::defaults::{
    DEFAULT_API_URL, DEFAULT_NAVIGATION_DELAY, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TRACKED_MODELS,
};
use crate::error::ConfigResult;
use crate::validate;

/// Settings consumed by the health dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Base URL of the health service.
    pub base_url: Url,
    /// Model identifiers shown as matrix columns, in display order.
    pub tracked_models: Vec<String>,
    /// Interval between background refreshes while the health view is active.
    pub poll_interval: Duration,
    /// Delay between switching to the accounts tab and opening the detail view.
    pub navigation_delay: Duration,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tracked_models: DEFAULT_TRACKED_MODELS.map(str::to_string).to_vec(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            navigation_delay: DEFAULT_NAVIGATION_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    /// Check every field, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::InvalidField`] naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate_base_url(&self.base_url)?;
        validate::validate_tracked_models(&self.tracked_models)?;
        validate::validate_positive("poll_interval", self.poll_interval)?;
        validate::validate_positive("request_timeout", self.request_timeout)?;
        Ok(())
    }

    /// Comma-joined tracked model list as sent in the `models` query parameter.
    #[must_use]
    pub fn models_query(&self) -> String {
        self.tracked_models.join(",")
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

/// On-disk YAML shape; every field is optional and falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Base URL of the health service.
    pub api_url: Option<String>,
    /// Tracked model identifiers.
    pub models: Option<Vec<String>>,
    /// Poll interval in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Navigation delay in milliseconds.
    pub navigation_delay_ms: Option<u64>,
    /// Request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}
