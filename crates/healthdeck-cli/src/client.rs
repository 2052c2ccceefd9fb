//! Shared client utilities, error types, and credential prompting for the CLI.

use std::fmt::{self, Display, Formatter};
use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use healthdeck_config::{ConfigError, DashboardConfig};
use healthdeck_dashboard::{
    CredentialPrompt, CredentialStore, DashboardContext, HealthDashboard, HttpHealthApi, Tab,
    TabStore,
};
use healthdeck_telemetry::Metrics;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidField { .. } => Self::validation(err.to_string()),
            other => Self::failure(other),
        }
    }
}

/// Dependencies constructed from the resolved configuration.
#[derive(Clone)]
pub(crate) struct CliDependencies {
    pub(crate) client: Client,
    pub(crate) metrics: Metrics,
}

impl CliDependencies {
    /// Construct a configured HTTP client and a fresh metrics registry.
    pub(crate) fn from_config(config: &DashboardConfig, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        let metrics = Metrics::new()
            .map_err(|err| CliError::failure(anyhow!("failed to build metrics registry: {err}")))?;

        Ok(Self { client, metrics })
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) dashboard: HealthDashboard,
}

impl AppContext {
    /// Wire the dashboard to the HTTP API, starting on `tab`.
    pub(crate) fn build(
        config: DashboardConfig,
        deps: &CliDependencies,
        password: Option<String>,
        tab: Tab,
    ) -> CliResult<Self> {
        let mut api = HttpHealthApi::with_client(deps.client.clone(), config.base_url.clone());
        if io::stdin().is_terminal() {
            api = api.with_prompt(Arc::new(TerminalPrompt));
        }

        let context = DashboardContext {
            credentials: CredentialStore::new(password),
            tabs: TabStore::new(tab),
            ..DashboardContext::default()
        }
        .with_metrics(deps.metrics.clone());
        let dashboard = HealthDashboard::new(config, Arc::new(api), context)?;
        Ok(Self { dashboard })
    }
}

/// Asks the operator for a new password on the controlling terminal.
pub(crate) struct TerminalPrompt;

#[async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn replacement(&self, _rejected: Option<&str>) -> Option<String> {
        let entered =
            tokio::task::spawn_blocking(|| rpassword::prompt_password("Password: ")).await;
        match entered {
            Ok(Ok(password)) if !password.trim().is_empty() => Some(password.trim().to_string()),
            Ok(Ok(_)) => None,
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "password prompt failed");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "password prompt task failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_validation_from_failure() {
        let validation = CliError::validation("bad input");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "bad input");

        let failure = CliError::failure(anyhow!("boom"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "boom");
        assert_eq!(failure.to_string(), "cli error");
    }

    #[test]
    fn invalid_config_fields_are_validation_errors() {
        let config = DashboardConfig {
            tracked_models: Vec::new(),
            ..DashboardConfig::default()
        };
        let err = CliError::from(config.validate().expect_err("empty models rejected"));
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("models"));
    }

    #[test]
    fn dependencies_reject_invalid_trace_ids() {
        let config = DashboardConfig::default();
        assert!(CliDependencies::from_config(&config, "trace-123").is_ok());
        let err = CliDependencies::from_config(&config, "bad\nvalue")
            .err()
            .expect("newline rejected");
        assert_eq!(err.exit_code(), 3);
    }
}
