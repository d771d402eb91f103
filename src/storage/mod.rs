use anyhow::{Context as _, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// A registered bearer token. The raw token is never stored — only its
/// SHA-256 digest.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiTokenRow {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: String,
}

/// SQLite-backed persistence. Owns the connection pool; components that
/// need their own handle clone it via [`Storage::pool`].
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("taskd.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create a TaskStore that shares the same SQLite connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ─── Bearer tokens ───────────────────────────────────────────────────

    /// Mint a bearer token for `user_id` and return the raw token.
    ///
    /// The raw value (UUID v4, hex without dashes = 32 chars) is returned
    /// exactly once; only its digest is persisted.
    pub async fn register_token(&self, user_id: &str) -> Result<String> {
        let token = Uuid::new_v4().to_string().replace('-', "");
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO api_tokens (token_hash, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(token)
    }

    /// Resolve a raw bearer token to its owning user id, if registered.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM api_tokens WHERE token_hash = ?")
                .bind(hash_token(token))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(user_id,)| user_id))
    }

    /// Revoke every token minted for `user_id`. Returns the revoked count.
    pub async fn revoke_tokens(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_tokens(&self) -> Result<Vec<ApiTokenRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM api_tokens ORDER BY created_at, token_hash")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

/// SHA-256 hex digest of a raw bearer token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
