//! Layered configuration loading: defaults, then YAML file, then environment.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::defaults::{ENV_API_URL, ENV_MODELS, ENV_POLL_INTERVAL_SECS, ENV_TIMEOUT_SECS};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigFile, DashboardConfig};
use crate::validate::{parse_api_url, parse_model_list, parse_secs};

/// Load configuration from an optional YAML file and the process environment.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or when any layer
/// produces an invalid value.
pub fn load(path: Option<&Path>) -> ConfigResult<DashboardConfig> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Load configuration using a caller-supplied environment lookup.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<F>(path: Option<&Path>, env: F) -> ConfigResult<DashboardConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = DashboardConfig::default();
    if let Some(path) = path {
        let file = read_file(path)?;
        apply_file(&mut config, file)?;
        debug!(path = %path.display(), "applied configuration file");
    }
    apply_env(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<ConfigFile> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_file(config: &mut DashboardConfig, file: ConfigFile) -> ConfigResult<()> {
    if let Some(url) = file.api_url {
        config.base_url = parse_api_url(&url)?;
    }
    if let Some(models) = file.models {
        config.tracked_models = models;
    }
    if let Some(secs) = file.poll_interval_secs {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Some(ms) = file.navigation_delay_ms {
        config.navigation_delay = Duration::from_millis(ms);
    }
    if let Some(secs) = file.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    Ok(())
}

fn apply_env<F>(config: &mut DashboardConfig, env: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(ENV_API_URL) {
        config.base_url = parse_api_url(&url)?;
    }
    if let Some(models) = env(ENV_MODELS) {
        let models = parse_model_list(&models);
        // An empty override keeps the previous list rather than failing.
        if !models.is_empty() {
            config.tracked_models = models;
        }
    }
    if let Some(secs) = env(ENV_POLL_INTERVAL_SECS) {
        config.poll_interval = parse_secs("poll_interval", &secs)?;
    }
    if let Some(secs) = env(ENV_TIMEOUT_SECS) {
        config.request_timeout = parse_secs("request_timeout", &secs)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write yaml");
        file
    }

    #[test]
    fn no_file_and_no_env_yields_defaults() {
        let config = load_with_env(None, env_from(&[])).expect("load");
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_yaml(
            "api_url: http://health.internal:9000\nmodels: [alpha, beta]\npoll_interval_secs: 5\nnavigation_delay_ms: 10\n",
        );
        let config = load_with_env(Some(file.path()), env_from(&[])).expect("load");
        assert_eq!(config.base_url.as_str(), "http://health.internal:9000/");
        assert_eq!(config.tracked_models, ["alpha", "beta"]);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.navigation_delay, Duration::from_millis(10));
    }

    #[test]
    fn env_overrides_file() {
        let file = write_yaml("models: [alpha]\npoll_interval_secs: 5\n");
        let config = load_with_env(
            Some(file.path()),
            env_from(&[
                (ENV_MODELS, "gamma, delta"),
                (ENV_POLL_INTERVAL_SECS, "12"),
                (ENV_API_URL, "https://health.example.com"),
            ]),
        )
        .expect("load");
        assert_eq!(config.tracked_models, ["gamma", "delta"]);
        assert_eq!(config.poll_interval, Duration::from_secs(12));
        assert_eq!(config.base_url.host_str(), Some("health.example.com"));
    }

    #[test]
    fn empty_models_override_keeps_previous_list() {
        let config = load_with_env(None, env_from(&[(ENV_MODELS, " , ")])).expect("load");
        assert_eq!(config.tracked_models, DashboardConfig::default().tracked_models);
    }

    #[test]
    fn invalid_values_are_reported() {
        let file = write_yaml("poll_interval_secs: 0\n");
        let err = load_with_env(Some(file.path()), env_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "poll_interval",
                ..
            }
        ));

        let unknown = write_yaml("colour: purple\n");
        let err = load_with_env(Some(unknown.path()), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = load_with_env(
            Some(Path::new("/definitely/missing/healthdeck.yaml")),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
