use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use template_relay::client::options_cache::{FileSnapshotStore, HttpOptionsSource, OptionsCache};
use template_relay::config::SyncConfig;

/// Keeps a local options snapshot in step with the relay's option version.
#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = SyncConfig::from_env().expect("Failed to load configuration");

    tracing::info!(
        api = %config.options_api_base,
        snapshot = %config.snapshot_path,
        "Starting options sync"
    );

    let source = HttpOptionsSource::new(&config.options_api_base);
    let mut cache = OptionsCache::new(FileSnapshotStore::new(&config.snapshot_path));
    let interval = Duration::from_secs(config.sync_interval_secs.max(1));

    loop {
        match cache.load(&source).await {
            Ok(snapshot) => {
                tracing::debug!(
                    companies = snapshot.companies.len(),
                    "Options snapshot up to date"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Options sync failed, will retry");
            }
        }
        sleep(interval).await;
    }
}
