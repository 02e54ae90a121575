use cdn_purge_config::{AppConfig, env};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// heroku CLI used to list releases
    pub heroku_bin: PathBuf,
    pub git_bin: PathBuf,
}

impl AppConfig for Config {
    fn from_environment() -> anyhow::Result<Self> {
        Ok(Self {
            heroku_bin: env("CDN_PURGE_HEROKU_BIN", "heroku".into())?,
            git_bin: env("CDN_PURGE_GIT_BIN", "git".into())?,
        })
    }
}
