use cdn_purge_opentelemetry::AnyMeterProvider;
use opentelemetry::metrics::{Counter, Gauge};

#[derive(Debug)]
pub struct PurgeMetrics {
    pub(crate) purges: Counter<u64>,
    pub(crate) purge_errors: Counter<u64>,
    pub(crate) rate_limit_remaining: Gauge<u64>,
    pub(crate) time_until_rate_limit_reset: Gauge<u64>,
}

impl PurgeMetrics {
    pub fn new(meter_provider: &AnyMeterProvider) -> Self {
        let meter = meter_provider.meter("fastly");
        const PREFIX: &str = "cdn_purge.fastly";
        Self {
            purges: meter
                .u64_counter(format!("{PREFIX}.purges"))
                .with_unit("1")
                .build(),
            purge_errors: meter
                .u64_counter(format!("{PREFIX}.purge_errors"))
                .with_unit("1")
                .build(),
            rate_limit_remaining: meter
                .u64_gauge(format!("{PREFIX}.rate_limit_remaining"))
                .with_unit("1")
                .build(),
            time_until_rate_limit_reset: meter
                .u64_gauge(format!("{PREFIX}.time_until_rate_limit_reset"))
                .with_unit("s")
                .build(),
        }
    }
}
