mod collected_metrics;
mod test_env;

pub use collected_metrics::{CollectedMetric, CollectedMetrics};
pub use test_env::TestMetrics;
