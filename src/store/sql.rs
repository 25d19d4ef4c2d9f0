// SQL storage backend
// One sqlx AnyConnection per request; every statement binds its inputs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{AnyConnection, Connection};

use super::{
    Connector, Fund, FundFields, NewTransaction, Product, ProductFields, Store, StoreError,
    Transaction, User, UserUpdate,
};

const USER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "password",
    "role",
    "status",
    "registration_date",
    "cart",
    "portfolio",
    "investment_settings",
];
const PRODUCT_COLUMNS: &[&str] = &[
    "id", "name", "price", "image_url", "brand", "category", "stock", "colors",
];
const FUND_COLUMNS: &[&str] = &["code", "name", "price"];
const TRANSACTION_COLUMNS: &[&str] =
    &["id", "user_id", "type", "description", "amount", "date"];

/// Select list that reads every column as text.
///
/// The Any driver cannot decode MySQL DECIMAL or DATE columns; text always decodes.
fn select_text(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("CAST({c} AS CHAR) AS {c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Connects to the database named by a `mysql://` or `sqlite:` URL
#[derive(Debug, Clone)]
pub struct SqlConnector {
    url: String,
    connect_timeout: Duration,
}

impl SqlConnector {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        sqlx::any::install_default_drivers();
        Self {
            url: url.into(),
            connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for SqlConnector {
    async fn connect(&self) -> Result<Box<dyn Store>, StoreError> {
        let conn = tokio::time::timeout(self.connect_timeout, AnyConnection::connect(&self.url))
            .await
            .map_err(|_| StoreError::Timeout(self.connect_timeout.as_secs()))?
            .map_err(|e| match e {
                sqlx::Error::Database(db) => StoreError::Connect(db.message().to_string()),
                other => StoreError::Connect(other.to_string()),
            })?;
        Ok(Box::new(SqlStore { conn }))
    }
}

/// A single open database session
pub struct SqlStore {
    conn: AnyConnection,
}

#[async_trait]
impl Store for SqlStore {
    async fn list_users(&mut self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {} FROM users", select_text(USER_COLUMNS));
        let rows = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows)
    }

    async fn find_user(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", select_text(USER_COLUMNS));
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(email.to_string())
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(row)
    }

    async fn find_password(&mut self, email: &str) -> Result<Option<String>, StoreError> {
        let password = sqlx::query_scalar::<_, Option<String>>(
            "SELECT CAST(password AS CHAR) FROM users WHERE email = ?",
        )
        .bind(email.to_string())
        .fetch_optional(&mut self.conn)
        .await?;
        Ok(password.flatten())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            USER_COLUMNS.join(", ")
        );
        sqlx::query(&sql)
            .bind(user.id.clone())
            .bind(user.name.clone())
            .bind(user.email.clone())
            .bind(user.password.clone())
            .bind(user.role.clone())
            .bind(user.status.clone())
            .bind(user.registration_date.clone())
            .bind(user.cart.clone())
            .bind(user.portfolio.clone())
            .bind(user.investment_settings.clone())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn update_user(&mut self, update: &UserUpdate) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET name = ?, cart = ?, portfolio = ?, investment_settings = ? \
             WHERE id = ?",
        )
        .bind(update.name.clone())
        .bind(update.cart.clone())
        .bind(update.portfolio.clone())
        .bind(update.investment_settings.clone())
        .bind(update.id.clone())
        .execute(&mut self.conn)
        .await?;
        Ok(())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {} FROM products", select_text(PRODUCT_COLUMNS));
        let rows = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows)
    }

    async fn insert_product(&mut self, product: &ProductFields) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO products ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            PRODUCT_COLUMNS.join(", ")
        );
        sqlx::query(&sql)
            .bind(product.id.clone())
            .bind(product.name.clone())
            .bind(product.price)
            .bind(product.image_url.clone())
            .bind(product.brand.clone())
            .bind(product.category.clone())
            .bind(product.stock)
            .bind(product.colors.clone())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn update_product(&mut self, product: &ProductFields) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE products SET name = ?, price = ?, image_url = ?, brand = ?, category = ?, \
             stock = ?, colors = ? WHERE id = ?",
        )
        .bind(product.name.clone())
        .bind(product.price)
        .bind(product.image_url.clone())
        .bind(product.brand.clone())
        .bind(product.category.clone())
        .bind(product.stock)
        .bind(product.colors.clone())
        .bind(product.id.clone())
        .execute(&mut self.conn)
        .await?;
        Ok(())
    }

    async fn delete_product(&mut self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn list_funds(&mut self) -> Result<Vec<Fund>, StoreError> {
        let sql = format!("SELECT {} FROM funds", select_text(FUND_COLUMNS));
        let rows = sqlx::query_as::<_, Fund>(&sql)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows)
    }

    async fn insert_fund(&mut self, fund: &FundFields) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO funds (code, name, price) VALUES (?, ?, ?)")
            .bind(fund.code.clone())
            .bind(fund.name.clone())
            .bind(fund.price)
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn update_fund(&mut self, fund: &FundFields) -> Result<(), StoreError> {
        sqlx::query("UPDATE funds SET name = ?, price = ? WHERE code = ?")
            .bind(fund.name.clone())
            .bind(fund.price)
            .bind(fund.code.clone())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn delete_fund(&mut self, code: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM funds WHERE code = ?")
            .bind(code.to_string())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn list_transactions(&mut self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY transactions.date DESC",
            select_text(TRANSACTION_COLUMNS)
        );
        let rows = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id.to_string())
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows)
    }

    async fn insert_transaction(&mut self, tx: &NewTransaction) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO transactions (user_id, type, description, amount, date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tx.user_id.clone())
        .bind(tx.kind.clone())
        .bind(tx.description.clone())
        .bind(tx.amount)
        .bind(tx.date.clone())
        .execute(&mut self.conn)
        .await?;
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), StoreError> {
        self.conn.ping().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::SqliteFixture;

    fn user(id: &str, email: &str) -> User {
        User {
            id: Some(id.to_string()),
            name: Some("Ada".to_string()),
            email: Some(email.to_string()),
            password: Some("secret".to_string()),
            role: Some("admin".to_string()),
            status: Some("active".to_string()),
            registration_date: Some("2024-01-01".to_string()),
            cart: Some(r#"[{"id":"p1","qty":2}]"#.to_string()),
            portfolio: Some("{}".to_string()),
            investment_settings: None,
        }
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        let fixture = SqliteFixture::new().await;
        let mut store = fixture.connector().connect().await.unwrap();

        let ada = user("u1", "ada@example.com");
        store.insert_user(&ada).await.unwrap();

        assert_eq!(store.list_users().await.unwrap(), vec![ada.clone()]);
        assert_eq!(store.find_user("ada@example.com").await.unwrap(), Some(ada));
        assert_eq!(store.find_user("nobody@example.com").await.unwrap(), None);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_find_password() {
        let fixture = SqliteFixture::new().await;
        let mut store = fixture.connector().connect().await.unwrap();
        store.insert_user(&user("u1", "ada@example.com")).await.unwrap();

        assert_eq!(
            store.find_password("ada@example.com").await.unwrap().as_deref(),
            Some("secret")
        );
        assert_eq!(store.find_password("missing@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_key_is_bound_not_spliced() {
        let fixture = SqliteFixture::new().await;
        let mut store = fixture.connector().connect().await.unwrap();
        store.insert_user(&user("u1", "ada@example.com")).await.unwrap();

        let found = store.find_user("' OR '1'='1").await.unwrap();
        assert!(found.is_none());

        store.delete_product("' OR '1'='1").await.unwrap();
        store.delete_fund("x'; DROP TABLE funds; --").await.unwrap();
        assert!(store.list_funds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_key_reports_database_message() {
        let fixture = SqliteFixture::new().await;
        let mut store = fixture.connector().connect().await.unwrap();
        let fund = FundFields {
            code: Some("AAA".to_string()),
            name: Some("Alpha".to_string()),
            price: Some(1.5),
        };
        store.insert_fund(&fund).await.unwrap();

        let err = store.insert_fund(&fund).await.unwrap_err();
        let message = err.message();
        assert!(message.contains("UNIQUE"), "unexpected message: {message}");
        assert!(!message.starts_with("error returned from database"));
    }

    #[tokio::test]
    async fn test_transactions_newest_first() {
        let fixture = SqliteFixture::new().await;
        let mut store = fixture.connector().connect().await.unwrap();
        for date in ["2024-01-03", "2024-01-01", "2024-01-02"] {
            let tx = NewTransaction {
                user_id: Some("u1".to_string()),
                kind: Some("buy".to_string()),
                description: Some(format!("on {date}")),
                amount: Some(10.0),
                date: Some(date.to_string()),
            };
            store.insert_transaction(&tx).await.unwrap();
        }
        store
            .insert_transaction(&NewTransaction {
                user_id: Some("u2".to_string()),
                date: Some("2024-02-01".to_string()),
                ..NewTransaction::default()
            })
            .await
            .unwrap();

        let dates: Vec<_> = store
            .list_transactions("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.date.unwrap_or_default())
            .collect();
        assert_eq!(dates, ["2024-01-03", "2024-01-02", "2024-01-01"]);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connect_error() {
        let connector = SqlConnector::new(
            "sqlite:///nonexistent-dir/gateway.db",
            Duration::from_secs(2),
        );
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, StoreError::Connect(_) | StoreError::Timeout(_)));
    }

    const DRIFTED_SCHEMA: &[&str] = &[
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name VARCHAR(64),
            email VARCHAR(128),
            password VARCHAR(64),
            role VARCHAR(16),
            status VARCHAR(16),
            registration_date DATETIME,
            cart TEXT,
            portfolio TEXT,
            investment_settings TEXT
        )",
        "CREATE TABLE funds (code VARCHAR(8) PRIMARY KEY, name VARCHAR(64), price DECIMAL(10,2))",
        "CREATE TABLE transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INT,
            type VARCHAR(16),
            description TEXT,
            amount DECIMAL(12,2),
            date DATE
        )",
    ];

    #[tokio::test]
    async fn test_reads_any_column_types() {
        let fixture = SqliteFixture::with_schema(DRIFTED_SCHEMA).await;
        let mut store = fixture.connector().connect().await.unwrap();

        for (code, price) in [("AAA", 60.0), ("BBB", 10.75)] {
            let fund = FundFields {
                code: Some(code.to_string()),
                name: Some(format!("Fund {code}")),
                price: Some(price),
            };
            store.insert_fund(&fund).await.unwrap();
        }
        let funds = serde_json::to_value(store.list_funds().await.unwrap()).unwrap();
        assert_eq!(funds[0]["price"].as_f64(), Some(60.0));
        assert_eq!(funds[1]["price"].as_f64(), Some(10.75));

        let mut ada = user("42", "ada@example.com");
        ada.registration_date = Some("2024-01-01 10:00:00".to_string());
        store.insert_user(&ada).await.unwrap();
        assert_eq!(store.find_user("ada@example.com").await.unwrap(), Some(ada));

        let tx = NewTransaction {
            user_id: Some("7".to_string()),
            kind: Some("deposit".to_string()),
            description: None,
            amount: Some(100.5),
            date: Some("2024-01-02".to_string()),
        };
        store.insert_transaction(&tx).await.unwrap();
        let rows = serde_json::to_value(store.list_transactions("7").await.unwrap()).unwrap();
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["user_id"], "7");
        assert_eq!(rows[0]["amount"].as_f64(), Some(100.5));
        assert_eq!(rows[0]["date"], "2024-01-02");
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_ping() {
        let fixture = SqliteFixture::new().await;
        let mut store = fixture.connector().connect().await.unwrap();
        store.ping().await.unwrap();
        store.close().await.unwrap();
    }
}
