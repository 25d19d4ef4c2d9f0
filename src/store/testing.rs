// Test fixture: a throwaway SQLite database with the four gateway tables

use std::time::Duration;

use sqlx::{AnyConnection, Connection};
use tempfile::TempDir;

use super::SqlConnector;

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id TEXT PRIMARY KEY,
        name TEXT,
        email TEXT UNIQUE,
        password TEXT,
        role TEXT,
        status TEXT,
        registration_date TEXT,
        cart TEXT,
        portfolio TEXT,
        investment_settings TEXT
    )",
    "CREATE TABLE products (
        id TEXT PRIMARY KEY,
        name TEXT,
        price REAL,
        image_url TEXT,
        brand TEXT,
        category TEXT,
        stock INTEGER,
        colors TEXT
    )",
    "CREATE TABLE funds (
        code TEXT PRIMARY KEY,
        name TEXT,
        price REAL
    )",
    "CREATE TABLE transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        type TEXT,
        description TEXT,
        amount REAL,
        date TEXT
    )",
];

/// Owns the temporary directory; the database disappears with the fixture
pub struct SqliteFixture {
    _dir: TempDir,
    url: String,
}

impl SqliteFixture {
    pub async fn new() -> Self {
        Self::with_schema(SCHEMA).await
    }

    /// Same fixture with caller-supplied `CREATE TABLE` statements
    pub async fn with_schema(schema: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("gateway.db").display());

        sqlx::any::install_default_drivers();
        let mut conn = AnyConnection::connect(&url).await.unwrap();
        for statement in schema {
            sqlx::query(*statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();

        Self { _dir: dir, url }
    }

    pub fn connector(&self) -> SqlConnector {
        SqlConnector::new(self.url.clone(), Duration::from_secs(5))
    }
}
