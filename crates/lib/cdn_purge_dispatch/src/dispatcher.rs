use crate::{
    DispatchError, DispatchMetrics, PurgeItem, WorkQueue,
    worker::{Worker, WorkerExit},
};
use cdn_purge_fastly::PurgeClient;
use cdn_purge_opentelemetry::AnyMeterProvider;
use opentelemetry::KeyValue;
use std::{num::NonZeroUsize, sync::Arc};
use tokio::task::JoinSet;
use tracing::{Instrument as _, error, info, info_span, instrument};

/// Result of a run in which every item was purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub workers: usize,
    pub purged: usize,
}

pub struct Dispatcher<C> {
    client: Arc<C>,
    metrics: DispatchMetrics,
}

impl<C> Dispatcher<C>
where
    C: PurgeClient + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, meter_provider: &AnyMeterProvider) -> Self {
        Self {
            client,
            metrics: DispatchMetrics::new(meter_provider),
        }
    }

    /// Purge every item, with at most `max_concurrency` purges in flight.
    ///
    /// Returns on the first failed purge without waiting for the other
    /// workers. Purges they already started may still complete in the
    /// background, their outcome is ignored.
    #[instrument(skip_all, fields(max_concurrency = max_concurrency.get()))]
    pub async fn run<I>(
        &self,
        items: I,
        max_concurrency: NonZeroUsize,
    ) -> Result<RunSummary, DispatchError>
    where
        I: IntoIterator,
        I::Item: Into<PurgeItem>,
    {
        let queue = Arc::new(WorkQueue::new(items));
        let worker_count = queue.remaining().min(max_concurrency.get());

        info!(items = queue.remaining(), worker_count, "starting purge");

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker::new(id, self.client.clone(), queue.clone());
            workers.spawn(worker.run().instrument(info_span!("worker", id)));
        }
        self.metrics.workers_started.add(worker_count as u64, &[]);

        let mut purged = 0;
        while let Some(joined) = workers.join_next().await {
            let exit = match joined {
                Ok(exit) => exit,
                Err(err) => {
                    queue.latch_failure();
                    workers.detach_all();
                    self.record_run("crashed");
                    return Err(err.into());
                }
            };

            match exit {
                WorkerExit::Done { purged: n } | WorkerExit::Cancelled { purged: n } => {
                    purged += n
                }
                WorkerExit::Failed { item, source } => {
                    let state = queue.state();
                    error!(
                        %item,
                        purged,
                        in_flight = state.in_flight,
                        remaining = state.items_remaining,
                        "purge failed, abandoning run"
                    );
                    workers.detach_all();
                    self.record_run("failed");
                    return Err(DispatchError::Purge { item, source });
                }
            }
        }

        info!(purged, "purge finished");
        self.record_run("success");
        Ok(RunSummary {
            workers: worker_count,
            purged,
        })
    }

    fn record_run(&self, outcome: &'static str) {
        self.metrics
            .runs
            .add(1, &[KeyValue::new("outcome", outcome)]);
    }
}
