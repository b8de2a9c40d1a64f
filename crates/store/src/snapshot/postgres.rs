//! `PostgreSQL` snapshot store.
//!
//! # Table: `cart_snapshot`
//!
//! - `key` - snapshot key (primary key)
//! - `value` - serialized cart
//! - `updated_at` - last save
//!
//! Migrations are embedded from `crates/store/migrations/` and applied with
//! [`PgSnapshotStore::migrate`].

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use super::{SnapshotError, SnapshotStore};

/// Snapshot store backed by a `PostgreSQL` table.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool suited to a single cart writer.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Database` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, SnapshotError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self { pool })
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Migration` if a migration fails.
    pub async fn migrate(&self) -> Result<(), SnapshotError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        let value = sqlx::query_scalar::<_, String>(
            r"
            SELECT value
            FROM cart_snapshot
            WHERE key = $1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        sqlx::query(
            r"
            INSERT INTO cart_snapshot (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
