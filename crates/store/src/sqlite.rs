//! SQLite-backed purchase/user store.
//!
//! One database file with two tables:
//! - `users` — registered users keyed by external id
//! - `purchases` — append-only purchase log
//!
//! Timestamps are stored as RFC 3339 text in UTC; `recent_purchases`
//! orders on them descending so the newest purchase comes first.

use async_trait::async_trait;
use chrono::Utc;
use shopclerk_core::{NewPurchase, Purchase, PurchaseStore, StoreError, User};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite purchase-history store.
pub struct SqlitePurchaseStore {
    pool: SqlitePool,
}

impl SqlitePurchaseStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite purchase store initialized at {path}");
        Ok(store)
    }

    /// Run schema migrations — creates the tables and query index.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT UNIQUE NOT NULL,
                first_name  TEXT,
                last_name   TEXT,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("users table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS purchases (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                store_name  TEXT NOT NULL,
                category    TEXT NOT NULL,
                amount      REAL NOT NULL DEFAULT 0.0,
                timestamp   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("purchases table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_purchases_user_time
             ON purchases(user_id, timestamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("purchases index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, StoreError> {
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| StoreError::QueryFailed(format!("user_id column: {e}")))?;
        let first_name: Option<String> = row
            .try_get("first_name")
            .map_err(|e| StoreError::QueryFailed(format!("first_name column: {e}")))?;
        let last_name: Option<String> = row
            .try_get("last_name")
            .map_err(|e| StoreError::QueryFailed(format!("last_name column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(User {
            user_id,
            first_name,
            last_name,
            created_at,
        })
    }

    fn row_to_purchase(row: &sqlx::sqlite::SqliteRow) -> Result<Purchase, StoreError> {
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| StoreError::QueryFailed(format!("user_id column: {e}")))?;
        let store_name: String = row
            .try_get("store_name")
            .map_err(|e| StoreError::QueryFailed(format!("store_name column: {e}")))?;
        let category: String = row
            .try_get("category")
            .map_err(|e| StoreError::QueryFailed(format!("category column: {e}")))?;
        let amount: f64 = row.try_get("amount").unwrap_or(0.0);
        let timestamp_str: String = row
            .try_get("timestamp")
            .map_err(|e| StoreError::QueryFailed(format!("timestamp column: {e}")))?;

        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Purchase {
            user_id,
            store_name,
            category,
            amount,
            timestamp,
        })
    }
}

#[async_trait]
impl PurchaseStore for SqlitePurchaseStore {
    async fn get_or_create_user(&self, user_id: &str) -> Result<User, StoreError> {
        let existing = sqlx::query("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("user lookup: {e}")))?;

        if let Some(row) = existing {
            return Self::row_to_user(&row);
        }

        let created_at = Utc::now();
        sqlx::query("INSERT INTO users (user_id, created_at) VALUES (?, ?)")
            .bind(user_id)
            .bind(created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("user insert: {e}")))?;

        debug!(user_id, "created user");
        Ok(User {
            user_id: user_id.to_string(),
            first_name: None,
            last_name: None,
            created_at,
        })
    }

    async fn record_purchase(
        &self,
        user_id: &str,
        purchase: NewPurchase,
    ) -> Result<Purchase, StoreError> {
        let timestamp = Utc::now();
        sqlx::query(
            "INSERT INTO purchases (user_id, store_name, category, amount, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&purchase.store_name)
        .bind(&purchase.category)
        .bind(purchase.amount)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("purchase insert: {e}")))?;

        debug!(user_id, store = %purchase.store_name, "recorded purchase");
        Ok(Purchase {
            user_id: user_id.to_string(),
            store_name: purchase.store_name,
            category: purchase.category,
            amount: purchase.amount,
            timestamp,
        })
    }

    async fn recent_purchases(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Purchase>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM purchases WHERE user_id = ?
             ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("purchase query: {e}")))?;

        rows.iter().map(Self::row_to_purchase).collect()
    }
}
