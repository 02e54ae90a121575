mod config;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub use config::Config;

use anyhow::Result;
use opentelemetry::{
    InstrumentationScope,
    metrics::{InstrumentProvider, Meter, MeterProvider},
};
use opentelemetry_otlp::{Protocol, WithExportConfig as _};
use opentelemetry_resource_detectors::{OsResourceDetector, ProcessResourceDetector};
use opentelemetry_sdk::{Resource, error::OTelSdkResult};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// `MeterProvider` plus `force_flush`.
///
/// A purge run is a short-lived process, so the binary flushes explicitly
/// instead of waiting for the next periodic export.
pub trait MeterProviderWithExt: MeterProvider {
    fn force_flush(&self) -> OTelSdkResult;
}

pub type AnyMeterProvider = Arc<dyn MeterProviderWithExt + Send + Sync>;

impl MeterProviderWithExt for opentelemetry_sdk::metrics::SdkMeterProvider {
    fn force_flush(&self) -> OTelSdkResult {
        self.force_flush()
    }
}

/// OTLP metric provider when an endpoint is configured, a no-op provider otherwise.
pub fn get_meter_provider(config: &Config) -> Result<AnyMeterProvider> {
    let Some(ref endpoint) = config.endpoint else {
        return Ok(Arc::new(NoopMeterProvider::new()));
    };

    let endpoint = endpoint.to_string();
    info!(endpoint, "setting up OpenTelemetry metrics exporter");

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_protocol(Protocol::Grpc)
        .with_timeout(Duration::from_secs(3))
        .with_temporality(opentelemetry_sdk::metrics::Temporality::Delta)
        .build()?;

    let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(env!("CARGO_PKG_NAME"))
                .with_detector(Box::new(OsResourceDetector))
                .with_detector(Box::new(ProcessResourceDetector))
                .build(),
        )
        .build();

    Ok(Arc::new(provider))
}

/// Hands out meters whose instruments record nothing.
#[derive(Debug, Default)]
pub struct NoopMeterProvider {
    _private: (),
}

impl NoopMeterProvider {
    pub fn new() -> Self {
        NoopMeterProvider { _private: () }
    }
}

impl MeterProvider for NoopMeterProvider {
    fn meter_with_scope(&self, _scope: InstrumentationScope) -> Meter {
        Meter::new(Arc::new(NoopMeter::default()))
    }
}

impl MeterProviderWithExt for NoopMeterProvider {
    fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NoopMeter {
    _private: (),
}

impl InstrumentProvider for NoopMeter {}
