//! Persistence sink.
//!
//! Writes one (passage, metadata, vector) row per insert. Each insert is
//! independent: a rejected row is reported to the caller and never blocks
//! subsequent inserts. The content hash is the upsert key, so re-running
//! the pipeline on unchanged sources updates rows in place instead of
//! duplicating them.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::embedding::vec_to_blob;
use crate::error::SinkError;
use crate::migrate::SCHEMA_VERSION;
use crate::models::Passage;

/// Insert (or refresh) one embedded passage.
///
/// Returns [`SinkError::MissingEmbedding`] if the passage has no vector —
/// a passage is never persisted while `embedding` is `None`.
pub async fn insert_passage(pool: &SqlitePool, passage: &Passage) -> Result<(), SinkError> {
    let vector = passage
        .embedding
        .as_ref()
        .ok_or(SinkError::MissingEmbedding)?;

    let blob = vec_to_blob(vector);
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO passages (
            id, collection, source_file, chunk_number, chunk_text,
            category, subcategory,
            applicable_patterns, applicable_contexts, applicable_practice_types,
            tokens_approx, priority_level, file_number, metadata_json,
            embedding, content_hash, is_active, version, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        ON CONFLICT(collection, content_hash) DO UPDATE SET
            chunk_text = excluded.chunk_text,
            category = excluded.category,
            subcategory = excluded.subcategory,
            applicable_patterns = excluded.applicable_patterns,
            applicable_contexts = excluded.applicable_contexts,
            applicable_practice_types = excluded.applicable_practice_types,
            tokens_approx = excluded.tokens_approx,
            priority_level = excluded.priority_level,
            file_number = excluded.file_number,
            metadata_json = excluded.metadata_json,
            embedding = excluded.embedding,
            is_active = 1,
            version = excluded.version,
            created_at = excluded.created_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&passage.collection)
    .bind(&passage.source_file)
    .bind(passage.sequence_number)
    .bind(&passage.text)
    .bind(&passage.category)
    .bind(&passage.subcategory)
    .bind(json_array(&passage.applicable_patterns))
    .bind(json_array(&passage.applicable_contexts))
    .bind(json_array(&passage.applicable_practice_types))
    .bind(passage.tokens_approx)
    .bind(passage.priority_level)
    .bind(passage.file_number)
    .bind(passage.metadata.to_string())
    .bind(blob)
    .bind(passage.content_hash())
    .bind(SCHEMA_VERSION)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

fn json_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}
