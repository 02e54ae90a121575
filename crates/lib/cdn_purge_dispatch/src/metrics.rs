use cdn_purge_opentelemetry::AnyMeterProvider;
use opentelemetry::metrics::Counter;

#[derive(Debug)]
pub struct DispatchMetrics {
    pub(crate) workers_started: Counter<u64>,
    pub(crate) runs: Counter<u64>,
}

impl DispatchMetrics {
    pub fn new(meter_provider: &AnyMeterProvider) -> Self {
        let meter = meter_provider.meter("dispatch");
        const PREFIX: &str = "cdn_purge.dispatch";
        Self {
            workers_started: meter
                .u64_counter(format!("{PREFIX}.workers_started"))
                .with_unit("1")
                .build(),
            runs: meter
                .u64_counter(format!("{PREFIX}.runs"))
                .with_unit("1")
                .build(),
        }
    }
}
