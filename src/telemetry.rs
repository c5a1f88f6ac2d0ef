// Logging setup shared by both binaries

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "prestige=info,tower_http=info,info";

/// Install a fmt subscriber filtered by RUST_LOG (falls back to
/// DEFAULT_LOG_FILTER). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
