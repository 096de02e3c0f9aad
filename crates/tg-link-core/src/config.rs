use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::handler::LinkHandler;
use crate::link::{ClientError, SecureLinkClient, DEFAULT_TIMEOUT};
use crate::secret::SharedSecret;
use crate::translate::{InvalidLocale, Locale, ResponseTranslator};

pub const DEFAULT_BASE_URL: &str = "https://laundryapp-one.vercel.app";

pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_SECRET: &str = "TELEGRAM_WEBHOOK_SECRET";
pub const ENV_LOCALE: &str = "TG_LINK_LOCALE";
pub const ENV_TIMEOUT_SECS: &str = "TG_LINK_TIMEOUT_SECS";

/// Process-wide settings for the linking bridge, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    base_url: Url,
    secret: Option<SharedSecret>,
    locale: Locale,
    timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("valid default base URL"),
            secret: None,
            locale: Locale::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BridgeConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// A missing secret is not an error here: every linking invocation reports
    /// it instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|value| !value.trim().is_empty()) {
            config = config.with_base_url(&base_url)?;
        }

        config.secret = lookup(ENV_SECRET).and_then(SharedSecret::new);

        if let Some(locale) = lookup(ENV_LOCALE).filter(|value| !value.trim().is_empty()) {
            config.locale = locale.parse()?;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|value| !value.trim().is_empty()) {
            config.timeout = parse_timeout(&raw)?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url =
            Url::parse(base_url.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
                value: base_url.to_owned(),
                source,
            })?;
        Ok(self)
    }

    pub fn with_secret(mut self, secret: Option<SharedSecret>) -> Self {
        self.secret = secret;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn secret(&self) -> Option<&SharedSecret> {
        self.secret.as_ref()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn translator(&self) -> ResponseTranslator {
        ResponseTranslator::new(self.locale)
    }

    pub fn client(&self) -> Result<SecureLinkClient, ClientError> {
        Ok(SecureLinkClient::new(&self.base_url)?.with_timeout(self.timeout))
    }

    /// Assemble a handler wired to the HTTP backend and `tracing` sink.
    pub fn handler(&self) -> Result<LinkHandler<SecureLinkClient>, ConfigError> {
        let handler = LinkHandler::new(self.client()?, self.secret.clone());
        Ok(handler.with_translator(self.translator()))
    }
}

pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_owned())),
    }
}

/// Errors raised while loading bridge configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    InvalidLocale(#[from] InvalidLocale),
    #[error("invalid timeout '{0}', expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = BridgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url().as_str(), "https://laundryapp-one.vercel.app/");
        assert!(config.secret().is_none());
        assert_eq!(config.locale(), Locale::Ru);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn reads_all_variables() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:3000"),
            (ENV_SECRET, "s3cret"),
            (ENV_LOCALE, "en"),
            (ENV_TIMEOUT_SECS, "3"),
        ]))
        .unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:3000/");
        assert_eq!(config.secret().map(SharedSecret::expose), Some("s3cret"));
        assert_eq!(config.locale(), Locale::En);
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let config = BridgeConfig::from_lookup(lookup(&[(ENV_SECRET, "  ")])).unwrap();
        assert!(config.secret().is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        let err = BridgeConfig::from_lookup(lookup(&[(ENV_BASE_URL, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let err = BridgeConfig::from_lookup(lookup(&[(ENV_LOCALE, "fr")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLocale(_)));

        let err = BridgeConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }

    #[test]
    fn client_uses_configured_timeout() {
        let config = BridgeConfig::default()
            .with_base_url("http://localhost:3000")
            .unwrap()
            .with_timeout(Duration::from_secs(2));
        let client = config.client().unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(2));
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:3000/api/telegram/link"
        );
    }
}
