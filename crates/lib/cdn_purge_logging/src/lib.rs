mod config;
mod log_format;
#[cfg(feature = "testing")]
pub mod testing;

pub use config::{Config, SentryConfig};
pub use log_format::{InvalidLogFormat, LogFormat};

use sentry::integrations::{panic as sentry_panic, tracing as sentry_tracing};
use tracing_subscriber::prelude::*;

/// Keeps the sentry client alive. Drop it right before the process exits so
/// queued events are sent.
pub struct Guard {
    #[allow(dead_code)]
    sentry_guard: Option<sentry::ClientInitGuard>,
}

pub fn init(config: Config) -> anyhow::Result<Guard> {
    let log_formatter = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let tracing_registry = tracing_subscriber::registry()
        .with(log_formatter)
        .with(config.filter);

    let sentry_guard = if let Some(sentry_config) = config.sentry {
        tracing::subscriber::set_global_default(tracing_registry.with(
            sentry_tracing::layer().event_filter(|md| {
                if md.fields().field("reported_to_sentry").is_some() {
                    sentry_tracing::EventFilter::Ignore
                } else {
                    sentry_tracing::default_event_filter(md)
                }
            }),
        ))?;

        Some(sentry::init((
            sentry_config.dsn,
            sentry::ClientOptions {
                release: Some(env!("CARGO_PKG_VERSION").into()),
                attach_stacktrace: true,
                traces_sample_rate: sentry_config.traces_sample_rate,
                ..Default::default()
            }
            .add_integration(sentry_panic::PanicIntegration::default()),
        )))
    } else {
        tracing::subscriber::set_global_default(tracing_registry)?;
        None
    };

    Ok(Guard { sentry_guard })
}
