mod env;

pub use env::{env, env_duration_secs, maybe_env, require_env};

use anyhow::Result;

/// The config trait implemented by every library and binary config in this workspace.
pub trait AppConfig: Sized {
    fn from_environment() -> Result<Self>;

    #[cfg(feature = "testing")]
    fn test_config() -> Result<Self> {
        Self::from_environment()
    }
}
