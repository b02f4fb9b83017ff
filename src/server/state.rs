use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::security::Security;
use crate::store::Store;

/// Shared by every handler and middleware
pub struct AppState {
    pub config: Config,
    pub store: Arc<Store>,
    pub security: Security,
}

impl AppState {
    /// Open the database under the configured data directory
    pub fn open(config: Config) -> Result<Arc<Self>> {
        let store = Store::open(&config.database_path())?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Store) -> Arc<Self> {
        Arc::new(Self {
            security: Security::new(config.security.clone()),
            store: Arc::new(store),
            config,
        })
    }
}
