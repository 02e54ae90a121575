use crate::PurgeItem;
use cdn_purge_fastly::PurgeError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to purge {item}")]
    Purge {
        item: PurgeItem,
        #[source]
        source: PurgeError,
    },

    #[error("purge worker crashed")]
    Worker(#[from] tokio::task::JoinError),
}
