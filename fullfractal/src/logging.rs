use std::str::FromStr;

use tracing::Level;

pub const LOG_LEVEL_ENV: &str = "FULLFRACTAL_LOG";

/// Installs a fmt subscriber once. The level comes from `FULLFRACTAL_LOG`
/// (`trace`..`error`) and defaults to INFO.
pub fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|x| Level::from_str(x.trim()).ok())
        .unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
