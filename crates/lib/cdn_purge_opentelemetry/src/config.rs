use anyhow::Result;
use cdn_purge_config::{AppConfig, maybe_env};
use url::Url;

#[derive(Debug)]
pub struct Config {
    // OTLP collector, metrics are discarded when unset
    pub endpoint: Option<Url>,
}

impl AppConfig for Config {
    fn from_environment() -> Result<Self> {
        Ok(Self {
            endpoint: maybe_env("OTEL_EXPORTER_OTLP_ENDPOINT")?,
        })
    }

    #[cfg(feature = "testing")]
    fn test_config() -> Result<Self> {
        Ok(Self { endpoint: None })
    }
}
