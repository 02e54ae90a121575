use anyhow::Result;
use cdn_purge_config::{AppConfig, env};
use std::num::NonZeroUsize;

const DEFAULT_MAX_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(10).unwrap();

#[derive(Debug)]
pub struct Config {
    /// upper bound of purge requests in flight at the same time
    pub max_concurrency: NonZeroUsize,

    pub fastly: cdn_purge_fastly::Config,
    pub changes: cdn_purge_changes::Config,
    pub opentelemetry: cdn_purge_opentelemetry::Config,
}

impl AppConfig for Config {
    fn from_environment() -> Result<Self> {
        Ok(Self {
            max_concurrency: env("CDN_PURGE_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?,
            fastly: cdn_purge_fastly::Config::from_environment()?,
            changes: cdn_purge_changes::Config::from_environment()?,
            opentelemetry: cdn_purge_opentelemetry::Config::from_environment()?,
        })
    }
}
