//! Storage client module
//!
//! The gateway never holds a connection between requests. A [`Connector`] is
//! injected at startup and asked for a fresh [`Store`] at the start of every
//! request; the store is closed (or dropped) before the response is written.

mod models;
pub mod sql;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;

pub use models::{
    Fund, FundFields, NewTransaction, Product, ProductFields, Transaction, User, UserUpdate,
};
pub use sql::SqlConnector;

/// Storage failures, carrying the driver's own message
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Connect(String),
    #[error("timed out after {0} seconds")]
    Timeout(u64),
    #[error("{}", describe_sqlx(.0))]
    Query(#[from] sqlx::Error),
}

impl StoreError {
    /// Raw message reported to clients
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Database errors keep only the server's message, without sqlx's prefix
fn describe_sqlx(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Opens one storage session per request
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Store>, StoreError>;
}

/// One open storage session; every method runs exactly one statement
#[async_trait]
pub trait Store: Send {
    async fn list_users(&mut self) -> Result<Vec<User>, StoreError>;
    async fn find_user(&mut self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_password(&mut self, email: &str) -> Result<Option<String>, StoreError>;
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;
    async fn update_user(&mut self, update: &UserUpdate) -> Result<(), StoreError>;

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError>;
    async fn insert_product(&mut self, product: &ProductFields) -> Result<(), StoreError>;
    async fn update_product(&mut self, product: &ProductFields) -> Result<(), StoreError>;
    async fn delete_product(&mut self, id: &str) -> Result<(), StoreError>;

    async fn list_funds(&mut self) -> Result<Vec<Fund>, StoreError>;
    async fn insert_fund(&mut self, fund: &FundFields) -> Result<(), StoreError>;
    async fn update_fund(&mut self, fund: &FundFields) -> Result<(), StoreError>;
    async fn delete_fund(&mut self, code: &str) -> Result<(), StoreError>;

    async fn list_transactions(&mut self, user_id: &str) -> Result<Vec<Transaction>, StoreError>;
    async fn insert_transaction(&mut self, tx: &NewTransaction) -> Result<(), StoreError>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&mut self) -> Result<(), StoreError>;

    /// Release the session; dropping the box releases it too, without the goodbye
    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}
