//! Log output for processes embedding kubesearch.

use crate::config::SearchConfig;
use kubesearch_core::Result;

/// Install a `tracing-subscriber` fmt subscriber at the configured level.
///
/// Returns `Ok(false)` if a global subscriber was already installed; the
/// existing one is kept.
///
/// # Errors
///
/// Returns `Error::Config` if the configured level is invalid.
pub fn init(config: &SearchConfig) -> Result<bool> {
    let level = config.level()?;
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .try_init()
        .is_ok();
    Ok(installed)
}
