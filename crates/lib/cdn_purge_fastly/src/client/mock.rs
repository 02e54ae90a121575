use crate::{
    PurgeError,
    client::{PurgeClient, PurgeResponse},
    encode::purge_url,
};
use http::StatusCode;
use std::{
    collections::HashSet,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use url::Url;

/// In-memory purge client that records every call.
///
/// Paths registered with [`MockPurgeClient::fail_on`] answer immediately with
/// a 500, everything else succeeds. An optional delay keeps successful calls
/// in flight long enough to observe concurrency.
#[derive(Debug, Default)]
pub struct MockPurgeClient {
    purged: Mutex<Vec<String>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockPurgeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every path a purge was issued for, failed ones included, in call order.
    pub fn purged(&self) -> Vec<String> {
        self.purged.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.purged.lock().unwrap().len()
    }

    /// The highest number of purges that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn url(path: &str) -> Result<Url, PurgeError> {
        purge_url(&Url::parse("https://api.fastly.test").unwrap(), "mock", path)
    }
}

impl PurgeClient for MockPurgeClient {
    async fn purge(&self, path: &str) -> Result<PurgeResponse, PurgeError> {
        self.purged.lock().unwrap().push(path.to_owned());
        let url = Self::url(path)?;

        // failures answer right away, successes take `delay`
        if self.failing.contains(path) {
            return Err(PurgeError::Status {
                url,
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "mock failure".into(),
            });
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(PurgeResponse {
            url,
            status: StatusCode::OK,
            body: r#"{"status": "ok"}"#.into(),
        })
    }
}
