//! Validation and parsing helpers for configuration values.

use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

pub(crate) fn validate_base_url(url: &Url) -> ConfigResult<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "api_url",
            Some(url.as_str()),
            "unsupported_scheme",
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::invalid(
            "api_url",
            Some(url.as_str()),
            "not_a_base_url",
        ));
    }
    Ok(())
}

pub(crate) fn validate_tracked_models(models: &[String]) -> ConfigResult<()> {
    if models.is_empty() {
        return Err(ConfigError::invalid("models", None, "must_not_be_empty"));
    }

    let mut seen = HashSet::with_capacity(models.len());
    for model in models {
        if model.trim().is_empty() {
            return Err(ConfigError::invalid("models", Some(model.as_str()), "blank_entry"));
        }
        if model.contains(',') {
            return Err(ConfigError::invalid("models", Some(model.as_str()), "contains_comma"));
        }
        if !seen.insert(model.as_str()) {
            return Err(ConfigError::invalid("models", Some(model.as_str()), "duplicate_entry"));
        }
    }
    Ok(())
}

pub(crate) fn validate_positive(field: &'static str, value: Duration) -> ConfigResult<()> {
    if value.is_zero() {
        return Err(ConfigError::invalid(field, Some("0"), "must_be_positive"));
    }
    Ok(())
}

/// Parse an API URL supplied by a file, environment variable or flag.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an absolute
/// http(s) URL.
pub fn parse_api_url(input: &str) -> ConfigResult<Url> {
    let url = Url::parse(input.trim())
        .map_err(|_| ConfigError::invalid("api_url", Some(input), "malformed_url"))?;
    validate_base_url(&url)?;
    Ok(url)
}

/// Split a comma-separated model list, trimming entries and dropping blanks.
#[must_use]
pub fn parse_model_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_secs(field: &'static str, input: &str) -> ConfigResult<Duration> {
    input
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::invalid(field, Some(input), "not_an_integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: ConfigError) -> &'static str {
        match err {
            ConfigError::InvalidField { reason, .. } => reason,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn tracked_models_reject_empty_blank_and_duplicates() {
        assert_eq!(
            reason(validate_tracked_models(&[]).unwrap_err()),
            "must_not_be_empty"
        );
        assert_eq!(
            reason(validate_tracked_models(&["a".into(), " ".into()]).unwrap_err()),
            "blank_entry"
        );
        assert_eq!(
            reason(validate_tracked_models(&["a".into(), "a".into()]).unwrap_err()),
            "duplicate_entry"
        );
        assert_eq!(
            reason(validate_tracked_models(&["a,b".into()]).unwrap_err()),
            "contains_comma"
        );
        assert!(validate_tracked_models(&["a".into(), "b".into()]).is_ok());
    }

    #[test]
    fn api_url_requires_http_scheme() {
        assert!(parse_api_url("http://localhost:8080").is_ok());
        assert!(parse_api_url(" https://health.example.com ").is_ok());
        assert_eq!(
            reason(parse_api_url("ftp://example.com").unwrap_err()),
            "unsupported_scheme"
        );
        assert_eq!(
            reason(parse_api_url("not a url").unwrap_err()),
            "malformed_url"
        );
    }

    #[test]
    fn model_list_parsing_trims_and_skips_blanks() {
        assert_eq!(
            parse_model_list(" a, b ,,c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(parse_model_list(" , ").is_empty());
    }

    #[test]
    fn zero_durations_are_rejected() {
        assert_eq!(
            reason(validate_positive("poll_interval", Duration::ZERO).unwrap_err()),
            "must_be_positive"
        );
        assert_eq!(
            parse_secs("poll_interval", "15").expect("parse"),
            Duration::from_secs(15)
        );
        assert_eq!(
            reason(parse_secs("poll_interval", "soon").unwrap_err()),
            "not_an_integer"
        );
    }
}
