//! Thread-safe configuration caching with arc-swap for lock-free reads.

use crate::loader::{ConfigError, ConfigLoader};
use crate::schema::Config;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{info, warn};

/// Thread-safe configuration cache using arc-swap for lock-free reads.
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Creates a new configuration cache with the given initial configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Gets the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Re-reads the configuration from its usual sources.
    ///
    /// On failure the previous configuration stays in place.
    pub fn reload(&self) -> Result<Arc<Config>, ConfigError> {
        self.reload_with(ConfigLoader::load)
    }

    /// Swaps in the configuration produced by `load`, keeping the current one
    /// if `load` fails.
    pub fn reload_with<F>(&self, load: F) -> Result<Arc<Config>, ConfigError>
    where
        F: FnOnce() -> Result<Config, ConfigError>,
    {
        match load() {
            Ok(config) => {
                let config = Arc::new(config);
                self.config.store(Arc::clone(&config));
                info!("Configuration reloaded");
                Ok(config)
            }
            Err(e) => {
                warn!(error = %e, "Configuration reload failed, keeping previous configuration");
                Err(e)
            }
        }
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
