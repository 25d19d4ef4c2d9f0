// Application state module
// Everything a connection task needs, shared behind one Arc

use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::gateway::Gateway;
use crate::store::{Connector, SqlConnector};

/// Application state
pub struct AppState {
    pub config: Config,
    pub gateway: Gateway,
}

impl AppState {
    /// Build state with the SQL connector named by `database.url`
    pub fn new(config: &Config) -> Self {
        let connector = SqlConnector::new(
            config.database.url.clone(),
            Duration::from_secs(config.database.connect_timeout),
        );
        Self::with_connector(config, Arc::new(connector))
    }

    pub fn with_connector(config: &Config, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: config.clone(),
            gateway: Gateway::new(connector),
        }
    }
}
