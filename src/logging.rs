use tracing_subscriber::EnvFilter;

use crate::config::CONFIG;

/// Installs the global subscriber. `RUST_LOG` wins over `logging.filter`.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&CONFIG.logging.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if crate::is_development!() {
        builder.with_target(true).try_init()
    } else {
        builder.with_target(false).with_ansi(false).try_init()
    };

    if result.is_ok() {
        tracing::debug!("Logging initialised for {:?}", CONFIG.environment);
    }
}
