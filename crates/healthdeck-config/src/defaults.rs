//! Default values applied when a setting is absent.
//!
//! # Design
//! - Keep every default in one place so the CLI help text and tests agree.

use std::time::Duration;

/// Base URL of a locally running health service.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
/// Models tracked when no list is configured, in display order.
pub const DEFAULT_TRACKED_MODELS: [&str; 4] = [
    "claude-opus-4-5-thinking",
    "claude-sonnet-4-5-thinking",
    "gemini-3-flash",
    "gemini-3-pro-high",
];
/// Interval between background refreshes while the health view is active.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Delay between switching tabs and asking the detail view to open.
pub const DEFAULT_NAVIGATION_DELAY: Duration = Duration::from_millis(50);
/// HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "HEALTHDECK_API_URL";
/// Environment variable overriding the tracked models (comma separated).
pub const ENV_MODELS: &str = "HEALTHDECK_MODELS";
/// Environment variable overriding the poll interval in seconds.
pub const ENV_POLL_INTERVAL_SECS: &str = "HEALTHDECK_POLL_INTERVAL_SECS";
/// Environment variable overriding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "HEALTHDECK_TIMEOUT_SECS";
