use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging so that tests print tracing events.
///
/// Call it at the beginning of a test. Only the first call in the process
/// installs the subscriber; the others are no-ops, so tests can call it
/// unconditionally.
pub fn init() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .init();
    });
}
