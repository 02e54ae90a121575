#[cfg(feature = "testing")]
pub mod mock;
pub mod real;

use crate::{Config, PurgeError};
use anyhow::Result;
use cdn_purge_opentelemetry::AnyMeterProvider;
use http::StatusCode;
use url::Url;

/// A successful purge: the API answered with a 2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeResponse {
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

/// Evicts a single path from the CDN cache.
///
/// One call is exactly one request, without retries. Any non-2xx answer and
/// any transport problem is returned as `PurgeError`.
pub trait PurgeClient {
    fn purge(&self, path: &str) -> impl Future<Output = Result<PurgeResponse, PurgeError>> + Send;
}

#[derive(Debug)]
pub enum Cdn {
    Real(real::RealPurgeClient),
    #[cfg(feature = "testing")]
    Mock(mock::MockPurgeClient),
}

/// normal functionality
impl Cdn {
    pub fn from_config(config: &Config, meter_provider: &AnyMeterProvider) -> Result<Self> {
        Ok(Self::Real(real::RealPurgeClient::from_config(
            config,
            meter_provider,
        )?))
    }
}

/// testing functionality
#[cfg(feature = "testing")]
impl Cdn {
    pub fn mock() -> Self {
        Self::Mock(mock::MockPurgeClient::default())
    }

    pub fn purged_paths(&self) -> Result<Vec<String>> {
        let Self::Mock(cdn) = self else {
            anyhow::bail!("found real cdn, no collected purges");
        };

        Ok(cdn.purged())
    }
}

impl PurgeClient for Cdn {
    async fn purge(&self, path: &str) -> Result<PurgeResponse, PurgeError> {
        match self {
            Self::Real(real) => real.purge(path).await,
            #[cfg(feature = "testing")]
            Self::Mock(mock) => mock.purge(path).await,
        }
    }
}
