mod config;

pub use config::Config;

use anyhow::{Context as _, Result};
use cdn_purge_changes::{ChangeSetSource, ReleaseSource, Releases};
use cdn_purge_dispatch::{Dispatcher, RunSummary};
use cdn_purge_fastly::PurgeClient;
use std::num::NonZeroUsize;
use tracing::{info, instrument};

/// Purge everything that changed between the two newest deploys.
///
/// Problems reading releases or the change set abort before any purge
/// request is sent.
#[instrument(skip_all)]
pub async fn purge_deploy<R, S, C>(
    releases: &R,
    changes: &S,
    dispatcher: &Dispatcher<C>,
    max_concurrency: NonZeroUsize,
) -> Result<RunSummary>
where
    R: ReleaseSource,
    S: ChangeSetSource,
    C: PurgeClient + Send + Sync + 'static,
{
    let Releases { current, previous } = releases
        .latest_releases()
        .await
        .context("failed to read the latest releases")?;

    let files = changes
        .changed_files(&previous, &current)
        .await
        .with_context(|| format!("failed to list files changed between {previous} and {current}"))?;

    if files.is_empty() {
        info!(%previous, %current, "no files changed between deploys");
    }

    Ok(dispatcher.run(files, max_concurrency).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdn_purge_changes::ChangesError;
    use cdn_purge_fastly::MockPurgeClient;
    use cdn_purge_opentelemetry::testing::TestMetrics;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    struct FixedReleases(Option<Releases>);

    impl ReleaseSource for FixedReleases {
        async fn latest_releases(&self) -> Result<Releases, ChangesError> {
            self.0
                .clone()
                .ok_or(ChangesError::NotEnoughReleases { found: 0 })
        }
    }

    #[derive(Default)]
    struct RecordingChanges {
        files: Vec<String>,
        asked: Mutex<Vec<(String, String)>>,
    }

    impl ChangeSetSource for RecordingChanges {
        async fn changed_files(
            &self,
            previous: &str,
            current: &str,
        ) -> Result<Vec<String>, ChangesError> {
            self.asked
                .lock()
                .unwrap()
                .push((previous.to_owned(), current.to_owned()));
            Ok(self.files.clone())
        }
    }

    fn releases() -> FixedReleases {
        FixedReleases(Some(Releases {
            current: "bbb".into(),
            previous: "aaa".into(),
        }))
    }

    #[tokio::test]
    async fn purges_changed_files_of_latest_deploy() -> Result<()> {
        let metrics = TestMetrics::new();
        let client = Arc::new(MockPurgeClient::new());
        let dispatcher = Dispatcher::new(client.clone(), metrics.provider());
        let changes = RecordingChanges {
            files: vec!["a.js".into(), "b.css".into(), "c.html".into()],
            ..Default::default()
        };

        let summary = purge_deploy(
            &releases(),
            &changes,
            &dispatcher,
            NonZeroUsize::new(2).unwrap(),
        )
        .await?;

        assert_eq!(summary.workers, 2);
        assert_eq!(summary.purged, 3);
        assert_eq!(
            *changes.asked.lock().unwrap(),
            vec![("aaa".to_string(), "bbb".to_string())]
        );

        let mut purged = client.purged();
        purged.sort();
        assert_eq!(purged, vec!["a.js", "b.css", "c.html"]);
        Ok(())
    }

    #[tokio::test]
    async fn release_failure_purges_nothing() {
        let metrics = TestMetrics::new();
        let client = Arc::new(MockPurgeClient::new());
        let dispatcher = Dispatcher::new(client.clone(), metrics.provider());
        let changes = RecordingChanges::default();

        let result = purge_deploy(
            &FixedReleases(None),
            &changes,
            &dispatcher,
            NonZeroUsize::new(2).unwrap(),
        )
        .await;

        assert!(result.is_err());
        assert!(changes.asked.lock().unwrap().is_empty());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_purge_fails_the_deploy() {
        let metrics = TestMetrics::new();
        let client = Arc::new(MockPurgeClient::new().fail_on("b.css"));
        let dispatcher = Dispatcher::new(client, metrics.provider());
        let changes = RecordingChanges {
            files: vec!["a.js".into(), "b.css".into(), "c.html".into()],
            ..Default::default()
        };

        let err = purge_deploy(
            &releases(),
            &changes,
            &dispatcher,
            NonZeroUsize::new(2).unwrap(),
        )
        .await
        .unwrap_err();

        assert!(
            err.downcast_ref::<cdn_purge_dispatch::DispatchError>()
                .is_some(),
            "{err:?}"
        );
    }
}
