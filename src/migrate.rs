//! Schema migrations for the passage store.
//!
//! One table holds every persisted passage across all collections; the
//! `collection` column partitions the logical knowledge bases.
//! `UNIQUE(collection, content_hash)` is what makes re-runs idempotent.

use anyhow::Result;
use sqlx::SqlitePool;

/// Fixed schema-version marker stamped onto every row.
pub const SCHEMA_VERSION: &str = "2";

/// Create the database file (if needed) and apply the schema. Used by
/// `kbi init`; idempotent.
pub async fn run_migrations(config: &crate::config::Config) -> Result<()> {
    let pool = crate::db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS passages (
            id TEXT PRIMARY KEY,
            collection TEXT NOT NULL,
            source_file TEXT NOT NULL,
            chunk_number INTEGER NOT NULL,
            chunk_text TEXT NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT,
            applicable_patterns TEXT NOT NULL DEFAULT '[]',
            applicable_contexts TEXT NOT NULL DEFAULT '[]',
            applicable_practice_types TEXT NOT NULL DEFAULT '[]',
            tokens_approx INTEGER NOT NULL,
            priority_level INTEGER NOT NULL,
            file_number INTEGER,
            metadata_json TEXT NOT NULL DEFAULT '{}',
            embedding BLOB NOT NULL,
            content_hash TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            version TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(collection, content_hash)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_passages_collection ON passages(collection)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_passages_source_file ON passages(source_file)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_passages_priority ON passages(collection, priority_level)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
