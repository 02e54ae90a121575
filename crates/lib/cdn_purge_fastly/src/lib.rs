mod client;
mod config;
mod encode;
mod error;
mod metrics;
mod rate_limit;

pub use client::{Cdn, PurgeClient, PurgeResponse, real::RealPurgeClient};
#[cfg(feature = "testing")]
pub use client::mock::MockPurgeClient;
pub use config::Config;
pub use encode::{encode_path_segment, encode_purge_path};
pub use error::PurgeError;
pub use metrics::PurgeMetrics;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
