//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries; this module only
//! parses the raw values so that request handling never consults process-wide state.

use crate::constants::{DEFAULT_FHIR_BASE_URL, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::{FinderError, FinderResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinderConfig {
    base_url: String,
    page_size: u32,
    request_timeout: Option<Duration>,
    refresh_after_mutation: bool,
}

impl FinderConfig {
    /// Create a new `FinderConfig`.
    ///
    /// A trailing `/` on `base_url` is removed.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Config`] if:
    /// - `base_url` is empty or not an absolute `http`/`https` URL,
    /// - `page_size` is outside `1..=MAX_PAGE_SIZE`.
    pub fn new(
        base_url: impl Into<String>,
        page_size: u32,
        request_timeout: Option<Duration>,
        refresh_after_mutation: bool,
    ) -> FinderResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(FinderError::Config(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        Ok(Self {
            base_url,
            page_size,
            request_timeout,
            refresh_after_mutation,
        })
    }

    /// Resolve configuration from optional raw values (typically environment variables).
    ///
    /// Missing or blank values fall back to the defaults.
    pub fn from_raw_values(
        base_url: Option<String>,
        page_size: Option<String>,
        request_timeout_secs: Option<String>,
        refresh_after_mutation: Option<String>,
    ) -> FinderResult<Self> {
        let base_url = non_blank(base_url).unwrap_or_else(|| DEFAULT_FHIR_BASE_URL.to_string());
        Self::new(
            base_url,
            page_size_from_env_value(page_size)?,
            timeout_from_env_value(request_timeout_secs)?,
            flag_from_env_value(refresh_after_mutation)?,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Whether add/edit/delete refetch the current page on success.
    pub fn refresh_after_mutation(&self) -> bool {
        self.refresh_after_mutation
    }

    pub fn with_base_url(self, base_url: impl Into<String>) -> FinderResult<Self> {
        Self::new(
            base_url,
            self.page_size,
            self.request_timeout,
            self.refresh_after_mutation,
        )
    }

    pub fn with_page_size(self, page_size: u32) -> FinderResult<Self> {
        Self::new(
            self.base_url,
            page_size,
            self.request_timeout,
            self.refresh_after_mutation,
        )
    }

    pub fn with_refresh_after_mutation(mut self, refresh: bool) -> Self {
        self.refresh_after_mutation = refresh;
        self
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FHIR_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
            refresh_after_mutation: false,
        }
    }
}

fn validate_base_url(base_url: &str) -> FinderResult<()> {
    if base_url.is_empty() {
        return Err(FinderError::Config("FHIR base URL cannot be empty".into()));
    }

    let url = reqwest::Url::parse(base_url)
        .map_err(|e| FinderError::Config(format!("invalid FHIR base URL '{base_url}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FinderError::Config(format!(
            "FHIR base URL must use http or https, got '{other}'"
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the page size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_PAGE_SIZE`].
pub fn page_size_from_env_value(value: Option<String>) -> FinderResult<u32> {
    match non_blank(value) {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| FinderError::Config(format!("invalid page size '{v}'"))),
    }
}

/// Parse a request timeout in whole seconds. `0` or a missing value means no timeout.
pub fn timeout_from_env_value(value: Option<String>) -> FinderResult<Option<Duration>> {
    match non_blank(value) {
        None => Ok(None),
        Some(v) => {
            let secs = v
                .parse::<u64>()
                .map_err(|_| FinderError::Config(format!("invalid request timeout '{v}'")))?;
            Ok((secs > 0).then(|| Duration::from_secs(secs)))
        }
    }
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`). Missing means `false`.
pub fn flag_from_env_value(value: Option<String>) -> FinderResult<bool> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(FinderError::Config(format!("invalid boolean flag '{v}'"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = FinderConfig::from_raw_values(None, None, None, None).expect("defaults");
        assert_eq!(cfg, FinderConfig::default());
        assert_eq!(cfg.base_url(), DEFAULT_FHIR_BASE_URL);
        assert_eq!(cfg.page_size(), 10);
        assert!(cfg.request_timeout().is_none());
        assert!(!cfg.refresh_after_mutation());
    }

    #[test]
    fn trims_trailing_slash() {
        let cfg = FinderConfig::new("http://localhost:8080/fhir/", 10, None, false).expect("ok");
        assert_eq!(cfg.base_url(), "http://localhost:8080/fhir");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = FinderConfig::new("ftp://example.org/fhir", 10, None, false).expect_err("ftp");
        assert!(matches!(err, FinderError::Config(_)));
    }

    #[test]
    fn rejects_relative_url() {
        assert!(FinderConfig::new("fhir/Patient", 10, None, false).is_err());
        assert!(FinderConfig::new("   ", 10, None, false).is_err());
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        assert!(FinderConfig::new(DEFAULT_FHIR_BASE_URL, 0, None, false).is_err());
        assert!(FinderConfig::new(DEFAULT_FHIR_BASE_URL, 101, None, false).is_err());
        assert!(FinderConfig::new(DEFAULT_FHIR_BASE_URL, 100, None, false).is_ok());
    }

    #[test]
    fn parses_raw_values() {
        let cfg = FinderConfig::from_raw_values(
            Some("https://hapi.fhir.org/baseR4".into()),
            Some(" 25 ".into()),
            Some("30".into()),
            Some("yes".into()),
        )
        .expect("valid values");
        assert_eq!(cfg.page_size(), 25);
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(30)));
        assert!(cfg.refresh_after_mutation());
    }

    #[test]
    fn zero_timeout_means_none() {
        assert_eq!(timeout_from_env_value(Some("0".into())).expect("ok"), None);
    }

    #[test]
    fn rejects_garbage_values() {
        assert!(page_size_from_env_value(Some("ten".into())).is_err());
        assert!(timeout_from_env_value(Some("-1".into())).is_err());
        assert!(flag_from_env_value(Some("maybe".into())).is_err());
    }
}
