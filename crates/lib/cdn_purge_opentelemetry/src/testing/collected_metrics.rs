use anyhow::{Result, anyhow};
use opentelemetry_sdk::metrics::data::{
    AggregatedMetrics, GaugeDataPoint, Metric, MetricData, ResourceMetrics, SumDataPoint,
};

/// What the in-memory exporter collected, with lookup helpers for assertions.
#[derive(Debug)]
pub struct CollectedMetrics(pub Vec<ResourceMetrics>);

impl CollectedMetrics {
    pub fn get_metric<'a>(
        &'a self,
        scope: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> Result<CollectedMetric<'a>> {
        let scope = scope.as_ref();
        let name = name.as_ref();

        let scope_metrics = self
            .0
            .iter()
            .flat_map(|rm| rm.scope_metrics())
            .filter(|sm| sm.scope().name() == scope)
            .last()
            .ok_or_else(|| anyhow!("Scope '{}' not found in collected metrics", scope))?;

        Ok(CollectedMetric(
            scope_metrics
                .metrics()
                .filter(|m| m.name() == name)
                .last()
                .ok_or_else(|| anyhow!("Metric '{}' not found in scope '{}'", name, scope))?,
        ))
    }
}

pub struct CollectedMetric<'a>(&'a Metric);

impl core::ops::Deref for CollectedMetric<'_> {
    type Target = Metric;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a> CollectedMetric<'a> {
    /// Sum over all attribute sets of a `u64` counter.
    pub fn u64_counter_total(&'a self) -> u64 {
        self.u64_sum_points().map(|point| point.value()).sum()
    }

    pub fn u64_sum_points(&'a self) -> impl Iterator<Item = &'a SumDataPoint<u64>> {
        let AggregatedMetrics::U64(metric_data) = self.data() else {
            panic!("Expected U64 metric data, got: {:?}", self.data());
        };

        let MetricData::Sum(sum) = metric_data else {
            panic!("Expected sum metric data, got: {:?}", metric_data);
        };

        sum.data_points()
    }

    pub fn get_u64_gauge(&'a self) -> &'a GaugeDataPoint<u64> {
        let AggregatedMetrics::U64(metric_data) = self.data() else {
            panic!("Expected U64 metric data, got: {:?}", self.data());
        };

        let MetricData::Gauge(gauge) = metric_data else {
            panic!("Expected gauge metric data, got: {:?}", metric_data);
        };

        gauge
            .data_points()
            .next()
            .expect("Expected at least one data point")
    }
}
