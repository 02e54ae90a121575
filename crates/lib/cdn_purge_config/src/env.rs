use anyhow::{Context as _, Result, anyhow};
use std::{env::VarError, error::Error, str::FromStr, time::Duration};
use tracing::trace;

pub fn env<T>(var: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    Ok(maybe_env(var)?.unwrap_or(default))
}

/// Read a whole number of seconds from `var`.
pub fn env_duration_secs(var: &str, default: Duration) -> Result<Duration> {
    Ok(maybe_env::<u64>(var)?
        .map(Duration::from_secs)
        .unwrap_or(default))
}

pub fn require_env<T>(var: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    maybe_env(var)?.with_context(|| anyhow!("configuration variable {} is missing", var))
}

pub fn maybe_env<T>(var: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    match std::env::var(var) {
        // an empty variable is treated like an unset one, so `FOO= cdn-purge`
        // doesn't fail on parsing.
        Ok(content) if content.trim().is_empty() => {
            trace!(var, "configuration variable is set but empty");
            Ok(None)
        }
        Ok(content) => Ok(content
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("failed to parse configuration variable {var}"))?),
        Err(VarError::NotPresent) => {
            trace!(var, "optional configuration variable is not set");
            Ok(None)
        }
        Err(VarError::NotUnicode(_)) => Err(anyhow!("configuration variable {} is not UTF-8", var)),
    }
}
