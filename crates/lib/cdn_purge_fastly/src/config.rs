use cdn_purge_config::{AppConfig, env, env_duration_secs, maybe_env};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// Fastly API host, typically only overwritten for testing
    pub api_host: Url,

    /// Fastly API token, sent as `Fastly-Key`.
    pub api_token: Option<String>,

    /// The Fastly service whose cache is purged.
    pub service_id: Option<String>,

    /// Timeout for each single purge request, the same for every call.
    pub request_timeout: Duration,

    /// Mark content as stale instead of evicting it.
    pub soft_purge: bool,

    /// Log URL and response body of every successful purge at `info` level.
    pub verbose: bool,
}

impl Config {
    pub fn is_valid(&self) -> bool {
        self.api_token.is_some() && self.service_id.is_some()
    }
}

impl AppConfig for Config {
    fn from_environment() -> anyhow::Result<Self> {
        Ok(Self {
            api_host: env(
                "CDN_PURGE_FASTLY_API_HOST",
                Url::parse("https://api.fastly.com")?,
            )?,
            api_token: maybe_env("CDN_PURGE_FASTLY_API_TOKEN")?,
            service_id: maybe_env("CDN_PURGE_FASTLY_SERVICE_ID")?,
            request_timeout: env_duration_secs(
                "CDN_PURGE_REQUEST_TIMEOUT",
                Duration::from_secs(30),
            )?,
            soft_purge: env("CDN_PURGE_SOFT_PURGE", false)?,
            verbose: env("CDN_PURGE_VERBOSE", false)?,
        })
    }

    #[cfg(any(test, feature = "testing"))]
    fn test_config() -> anyhow::Result<Self> {
        Ok(Self {
            api_host: "http://127.0.0.1:1".parse()?,
            api_token: Some("test-token".into()),
            service_id: Some("test-service".into()),
            request_timeout: Duration::from_secs(5),
            soft_purge: false,
            verbose: true,
        })
    }
}
