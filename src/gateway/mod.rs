//! Request dispatcher
//!
//! Resolves the `action` query parameter against the [`ActionTable`], opens a
//! storage session from the injected [`Connector`], runs the one handler and
//! closes the session again. Nothing survives between requests.

pub mod actions;
pub mod reply;
pub mod request;

use std::sync::Arc;

use serde_json::Value;

use crate::logger;
use crate::store::{Connector, StoreError};

pub use actions::{ActionTable, BodyPolicy};
pub use request::ActionRequest;

/// The dispatcher, shared by every connection
pub struct Gateway {
    connector: Arc<dyn Connector>,
    actions: ActionTable,
}

impl Gateway {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_actions(connector, ActionTable::default())
    }

    pub fn with_actions(connector: Arc<dyn Connector>, actions: ActionTable) -> Self {
        Self { connector, actions }
    }

    /// Run the request's action and produce its JSON reply
    pub async fn dispatch(&self, req: &ActionRequest) -> Value {
        let name = req.action();
        let Some(action) = self.actions.get(name) else {
            return reply::invalid_action();
        };

        if action.body == BodyPolicy::Required && !req.has_body() {
            return reply::no_data();
        }

        let mut store = match self.connector.connect().await {
            Ok(store) => store,
            Err(e) => {
                logger::log_error(&format!("Storage connection failed for '{name}': {e}"));
                return reply::connection_failed(&e);
            }
        };

        let value = (action.handler)(store.as_mut(), req).await;

        if let Err(e) = store.close().await {
            logger::log_warning(&format!("Failed to close storage session: {e}"));
        }
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            logger::log_action_failed(name, message);
        }
        value
    }

    /// Open and close one session, for the readiness probe
    pub async fn check_storage(&self) -> Result<(), StoreError> {
        let mut store = self.connector.connect().await?;
        store.ping().await?;
        store.close().await
    }
}
