use crate::{
    APP_USER_AGENT, Config, PurgeError, PurgeMetrics,
    client::{PurgeClient, PurgeResponse},
    encode::{encode_path_segment, purge_url},
    rate_limit::RateLimitState,
};
use anyhow::{Context as _, Result, bail};
use cdn_purge_opentelemetry::AnyMeterProvider;
use chrono::Utc;
use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT, USER_AGENT},
};
use opentelemetry::KeyValue;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const FASTLY_KEY: HeaderName = HeaderName::from_static("fastly-key");
const FASTLY_SOFT_PURGE: HeaderName = HeaderName::from_static("fastly-soft-purge");

#[derive(Debug)]
pub struct RealPurgeClient {
    client: reqwest::Client,
    api_host: Url,
    service_id: String,
    service_segment: String,
    soft_purge: bool,
    verbose: bool,
    metrics: PurgeMetrics,
    metric_attributes: Vec<KeyValue>,
}

impl RealPurgeClient {
    pub fn from_config(config: &Config, meter_provider: &AnyMeterProvider) -> Result<Self> {
        let Some(ref api_token) = config.api_token else {
            bail!("Fastly API token not configured");
        };

        let Some(ref service_id) = config.service_id else {
            bail!("Fastly service id not configured");
        };

        let service_segment = encode_path_segment(service_id)
            .with_context(|| format!("invalid Fastly service id {service_id:?}"))?;

        let mut api_key = HeaderValue::from_str(api_token)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(APP_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(FASTLY_KEY, api_key);

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(config.request_timeout)
                .build()?,
            api_host: config.api_host.clone(),
            service_id: service_id.clone(),
            service_segment,
            soft_purge: config.soft_purge,
            verbose: config.verbose,
            metrics: PurgeMetrics::new(meter_provider),
            metric_attributes: vec![KeyValue::new("service_id", service_id.clone())],
        })
    }

    fn purge_url(&self, path: &str) -> Result<Url, PurgeError> {
        purge_url(&self.api_host, &self.service_segment, path)
    }

    fn record_rate_limit_metrics(&self, state: &RateLimitState) {
        if let Some(remaining) = state.remaining {
            self.metrics
                .rate_limit_remaining
                .record(remaining, &self.metric_attributes);
        }

        if let Some(seconds) = state.seconds_until_reset(Utc::now()) {
            self.metrics
                .time_until_rate_limit_reset
                .record(seconds, &self.metric_attributes);
        }
    }

    fn record_error(&self, err: &PurgeError) {
        let mut attributes = self.metric_attributes.clone();
        attributes.push(KeyValue::new("kind", err.kind()));
        self.metrics.purge_errors.add(1, &attributes);
    }
}

impl PurgeClient for RealPurgeClient {
    #[instrument(skip(self), fields(service_id = %self.service_id))]
    async fn purge(&self, path: &str) -> Result<PurgeResponse, PurgeError> {
        let url = match self.purge_url(path) {
            Ok(url) => url,
            Err(err) => {
                self.record_error(&err);
                return Err(err);
            }
        };

        let mut request = self.client.post(url.clone());
        if self.soft_purge {
            request = request.header(FASTLY_SOFT_PURGE, "1");
        }

        if self.verbose {
            info!(%url, "sending purge request");
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                // connection errors, timeouts or similar, where we don't have a response
                let err = PurgeError::Transport { url, source };
                self.record_error(&err);
                error!(?err, "Failed to purge path from Fastly");
                return Err(err);
            }
        };

        let status = response.status();
        let rate_limit = RateLimitState::from_headers(response.headers());
        self.record_rate_limit_metrics(&rate_limit);

        let body = read_body(&url, response.text().await);

        if status.is_success() {
            self.metrics.purges.add(1, &self.metric_attributes);

            if self.verbose {
                info!(%url, %status, body, "purged path");
            } else {
                debug!(%url, %status, "purged path");
            }

            Ok(PurgeResponse { url, status, body })
        } else {
            error!(
                %url,
                %status,
                body,
                rate_limit_remaining = rate_limit.remaining,
                rate_limit_reset = rate_limit.reset.map(|dt| dt.to_rfc3339()),
                "Failed to purge path from Fastly"
            );

            let err = PurgeError::Status { url, status, body };
            self.record_error(&err);
            Err(err)
        }
    }
}

/// The response body, or a marker describing why it could not be read.
fn read_body(url: &Url, body: reqwest::Result<String>) -> String {
    match body {
        Ok(body) => body,
        Err(err) => {
            warn!(%url, ?err, "Failed to read Fastly response body");
            format!("<unreadable response body: {err}>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdn_purge_config::AppConfig as _;
    use cdn_purge_opentelemetry::testing::TestMetrics;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn config(server: &mockito::Server) -> Config {
        Config {
            api_host: server.url().parse().unwrap(),
            ..Config::test_config().unwrap()
        }
    }

    #[tokio::test]
    async fn test_purge() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", "/service/test-service/purge/static/app.js")
            .match_header(FASTLY_KEY, "test-token")
            .match_header(ACCEPT, "application/json")
            .with_status(200)
            .with_body(r#"{"status": "ok", "id": "108-1391560174-974124"}"#)
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&config(&fastly_api), test_metrics.provider())?;

        let response = client.purge("/static/app.js").await?;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"status": "ok", "id": "108-1391560174-974124"}"#);
        assert_eq!(
            response.url.as_str(),
            format!("{}/service/test-service/purge/static/app.js", fastly_api.url())
        );

        m.assert_async().await;

        assert_eq!(
            1,
            test_metrics
                .collected_metrics()
                .get_metric("fastly", "cdn_purge.fastly.purges")?
                .u64_counter_total()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_purge_encodes_path() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", "/service/test-service/purge/static/my%20file.html")
            .with_status(200)
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&config(&fastly_api), test_metrics.provider())?;

        client.purge("static/my file.html").await?;

        m.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_purge_header() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", "/service/test-service/purge/a.js")
            .match_header(FASTLY_SOFT_PURGE, "1")
            .with_status(200)
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(
            &Config {
                soft_purge: true,
                ..config(&fastly_api)
            },
            test_metrics.provider(),
        )?;

        client.purge("a.js").await?;

        m.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_error_status() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", "/service/test-service/purge/b.css")
            .with_status(500)
            .with_header("fastly-ratelimit-remaining", "41")
            .with_header("fastly-ratelimit-reset", "1452032384")
            .with_body("upstream broke")
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&config(&fastly_api), test_metrics.provider())?;

        let err = client.purge("b.css").await.unwrap_err();
        let PurgeError::Status { status, body, .. } = &err else {
            panic!("expected status error, got {err:?}");
        };
        assert_eq!(*status, 500);
        assert_eq!(body, "upstream broke");

        m.assert_async().await;

        let collected = test_metrics.collected_metrics();
        assert_eq!(
            1,
            collected
                .get_metric("fastly", "cdn_purge.fastly.purge_errors")?
                .u64_counter_total()
        );
        assert_eq!(
            41,
            collected
                .get_metric("fastly", "cdn_purge.fastly.rate_limit_remaining")?
                .get_u64_gauge()
                .value()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_redirect_is_not_success() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", "/service/test-service/purge/a.js")
            .with_status(304)
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&config(&fastly_api), test_metrics.provider())?;

        assert!(matches!(
            client.purge("a.js").await,
            Err(PurgeError::Status { .. })
        ));

        m.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_error() -> Result<()> {
        let test_metrics = TestMetrics::new();
        // nothing listens on port 1
        let client = RealPurgeClient::from_config(
            &Config {
                api_host: "http://127.0.0.1:1".parse()?,
                request_timeout: Duration::from_secs(2),
                ..Config::test_config()?
            },
            test_metrics.provider(),
        )?;

        let err = client.purge("a.js").await.unwrap_err();
        assert!(matches!(err, PurgeError::Transport { .. }), "{err:?}");

        Ok(())
    }

    #[tokio::test]
    async fn test_same_path_twice_purges_twice() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", "/service/test-service/purge/a.js")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&config(&fastly_api), test_metrics.provider())?;

        client.purge("a.js").await?;
        client.purge("a.js").await?;

        m.assert_async().await;
        Ok(())
    }

    #[test]
    fn test_purge_url_stays_on_purge_endpoint() -> Result<()> {
        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&Config::test_config()?, test_metrics.provider())?;

        for path in ["../purge_all", "../../other/purge_all", "a/./b.js"] {
            let err = client.purge_url(path).unwrap_err();
            assert!(matches!(err, PurgeError::InvalidPath { .. }), "{path}: {err:?}");
        }

        assert_eq!(
            client.purge_url("dir\\file.js")?.path(),
            "/service/test-service/purge/dir%5Cfile.js"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_dot_segments_are_never_sent() -> Result<()> {
        let mut fastly_api = mockito::Server::new_async().await;

        let m = fastly_api
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(&config(&fastly_api), test_metrics.provider())?;

        let err = client.purge("../purge_all").await.unwrap_err();
        assert!(matches!(err, PurgeError::InvalidPath { .. }), "{err:?}");

        m.assert_async().await;
        assert_eq!(
            1,
            test_metrics
                .collected_metrics()
                .get_metric("fastly", "cdn_purge.fastly.purge_errors")?
                .u64_counter_total()
        );
        Ok(())
    }

    #[test]
    fn test_service_id_is_one_segment() -> Result<()> {
        let test_metrics = TestMetrics::new();
        let client = RealPurgeClient::from_config(
            &Config {
                service_id: Some("abc/purge_all?x".into()),
                ..Config::test_config()?
            },
            test_metrics.provider(),
        )?;

        let url = client.purge_url("a.js")?;
        assert_eq!(url.path(), "/service/abc%2Fpurge_all%3Fx/purge/a.js");
        assert_eq!(url.query(), None);

        let dot_service = Config {
            service_id: Some("..".into()),
            ..Config::test_config()?
        };
        assert!(RealPurgeClient::from_config(&dot_service, test_metrics.provider()).is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_body_is_reported() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        // nothing listens on port 1, any reqwest error will do
        let err = reqwest::Client::new()
            .get(url.clone())
            .send()
            .await
            .unwrap_err();

        let body = read_body(&url, Err(err));
        assert!(body.starts_with("<unreadable response body: "), "{body}");
        assert_eq!(read_body(&url, Ok("ok".into())), "ok");
    }

    #[test]
    fn test_missing_credentials() {
        let test_metrics = TestMetrics::new();

        let no_token = Config {
            api_token: None,
            ..Config::test_config().unwrap()
        };
        assert!(RealPurgeClient::from_config(&no_token, test_metrics.provider()).is_err());

        let no_service = Config {
            service_id: None,
            ..Config::test_config().unwrap()
        };
        assert!(RealPurgeClient::from_config(&no_service, test_metrics.provider()).is_err());
    }
}
