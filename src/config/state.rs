// Application state module
// Read-only state shared by every connection

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::assets::DirectoryAssets;

/// Application state
pub struct AppState {
    pub config: Config,
    pub assets: DirectoryAssets,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let assets = DirectoryAssets::new(
            PathBuf::from(&config.assets.dir),
            config.assets.cache_max_age,
        );

        Self {
            config: config.clone(),
            assets,
            active_connections: AtomicUsize::new(0),
        }
    }
}
