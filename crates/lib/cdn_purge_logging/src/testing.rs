use crate::config::Config;

/// Install a subscriber that writes through the test harness, so output
/// is only shown for failing tests.
pub fn init() {
    let Ok(filter) = Config::filter_from_env("cdn_purge=debug") else {
        return;
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
