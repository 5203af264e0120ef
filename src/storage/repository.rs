use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use super::MIGRATION_001_DOCUMENTS;

/// Document collections mirrored from the storefront's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Orders,
    Expenses,
    Payouts,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Expenses => "expenses",
            Collection::Payouts => "payouts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "orders" | "payment_orders" | "paymentorders" => Some(Collection::Orders),
            "expenses" => Some(Collection::Expenses),
            "payouts" => Some(Collection::Payouts),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Value,
    pub updated_at: DateTime<Utc>,
}

/// Repository for the local document cache.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_DOCUMENTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Insert or replace a document.
    pub async fn upsert_document(
        &self,
        collection: Collection,
        id: &str,
        body: &Value,
    ) -> Result<()> {
        let body_json = serde_json::to_string(body)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&body_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save {} document {}", collection, id))?;

        Ok(())
    }

    /// Get a single document.
    pub async fn get_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            r#"
            SELECT id, body, updated_at
            FROM documents
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch document")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// Delete a document. Returns true if it existed.
    pub async fn delete_document(&self, collection: Collection, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete document")?;
        Ok(result.rows_affected() > 0)
    }

    /// List every document of a collection, ordered by id.
    /// Always a full snapshot of the collection.
    pub async fn list_documents(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT id, body, updated_at
            FROM documents
            WHERE collection = ?
            ORDER BY id
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to list {}", collection))?;

        rows.iter().map(Self::row_to_document).collect()
    }

    /// Count documents in a collection.
    pub async fn count_documents(&self, collection: Collection) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM documents WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count documents")?;
        Ok(row.get("count"))
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<StoredDocument> {
        let id: String = row.get("id");
        let body_str: String = row.get("body");
        let updated_at_str: String = row.get("updated_at");

        Ok(StoredDocument {
            body: serde_json::from_str(&body_str)
                .with_context(|| format!("Invalid JSON body for document {}", id))?,
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .context("Invalid updated_at timestamp")?
                .with_timezone(&Utc),
            id,
        })
    }
}
