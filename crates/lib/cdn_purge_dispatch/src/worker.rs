use crate::{PurgeItem, Take, WorkQueue};
use cdn_purge_fastly::{PurgeClient, PurgeError};
use std::sync::Arc;
use tracing::{debug, trace};

/// How a worker's loop ended.
#[derive(Debug)]
pub(crate) enum WorkerExit {
    /// The queue ran empty.
    Done { purged: usize },
    /// Another worker latched a failure.
    Cancelled { purged: usize },
    Failed { item: PurgeItem, source: PurgeError },
}

pub(crate) struct Worker<C> {
    id: usize,
    client: Arc<C>,
    queue: Arc<WorkQueue>,
}

impl<C: PurgeClient> Worker<C> {
    pub(crate) fn new(id: usize, client: Arc<C>, queue: Arc<WorkQueue>) -> Self {
        Self { id, client, queue }
    }

    pub(crate) async fn run(self) -> WorkerExit {
        let mut purged = 0;

        loop {
            let claim = match self.queue.take_one() {
                Take::Item(claim) => claim,
                Take::Empty => {
                    debug!(worker = self.id, purged, "queue drained");
                    return WorkerExit::Done { purged };
                }
                Take::Failed => {
                    debug!(worker = self.id, purged, "stopping after failure");
                    return WorkerExit::Cancelled { purged };
                }
            };

            trace!(worker = self.id, item = %claim.item(), "purging");
            match self.client.purge(claim.item().as_str()).await {
                Ok(_) => purged += 1,
                Err(source) => {
                    self.queue.latch_failure();
                    return WorkerExit::Failed {
                        item: claim.item().clone(),
                        source,
                    };
                }
            }
        }
    }
}
