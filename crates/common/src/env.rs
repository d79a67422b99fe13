//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before the listener binds.

use tracing::{info, warn};

/// Check that the static front-end directory exists; a missing directory only
/// produces a warning because the JSON API keeps working without it.
pub async fn ensure_env(static_dir: &str) -> anyhow::Result<()> {
    match tokio::fs::metadata(static_dir).await {
        Ok(meta) if meta.is_dir() => {
            info!(%static_dir, "static assets directory found");
        }
        Ok(_) => {
            return Err(anyhow::anyhow!("{static_dir} exists but is not a directory"));
        }
        Err(_) => {
            warn!(%static_dir, "static assets directory not found; front-end pages will 404");
        }
    }
    Ok(())
}
