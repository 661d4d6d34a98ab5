//! Database statistics and health overview.
//!
//! Provides a quick summary of what's ingested: passage counts, token
//! totals, and per-collection / per-source breakdowns. Used by `kbi stats`
//! to give confidence that ingestion runs landed what they were supposed to.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-collection breakdown of passage counts and sizes.
struct CollectionStats {
    collection: String,
    passage_count: i64,
    tokens_approx: i64,
    source_count: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_passages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passages")
        .fetch_one(&pool)
        .await?;

    let total_tokens: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(tokens_approx), 0) FROM passages")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Knowledge Base — Ingest Stats");
    println!("=============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Passages:    {}", total_passages);
    println!("  ~Tokens:     {}", total_tokens);

    let collection_rows = sqlx::query(
        r#"
        SELECT
            collection,
            COUNT(*) AS passage_count,
            COALESCE(SUM(tokens_approx), 0) AS tokens_approx,
            COUNT(DISTINCT source_file) AS source_count
        FROM passages
        GROUP BY collection
        ORDER BY passage_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let collection_stats: Vec<CollectionStats> = collection_rows
        .iter()
        .map(|row| CollectionStats {
            collection: row.get("collection"),
            passage_count: row.get("passage_count"),
            tokens_approx: row.get("tokens_approx"),
            source_count: row.get("source_count"),
        })
        .collect();

    if !collection_stats.is_empty() {
        println!();
        println!("  By collection:");
        println!(
            "  {:<24} {:>8} {:>10} {:>8}",
            "COLLECTION", "PASSAGES", "~TOKENS", "SOURCES"
        );
        println!("  {}", "-".repeat(54));

        for s in &collection_stats {
            println!(
                "  {:<24} {:>8} {:>10} {:>8}",
                s.collection, s.passage_count, s.tokens_approx, s.source_count
            );
        }
    }

    let source_rows = sqlx::query(
        r#"
        SELECT
            source_file,
            category,
            COUNT(*) AS passage_count,
            MAX(created_at) AS last_ingest
        FROM passages
        GROUP BY source_file, category
        ORDER BY source_file
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !source_rows.is_empty() {
        println!();
        println!("  By source file:");
        println!(
            "  {:<32} {:<16} {:>8}   {}",
            "FILE", "CATEGORY", "PASSAGES", "LAST INGEST"
        );
        println!("  {}", "-".repeat(76));

        for row in &source_rows {
            let last_ingest: Option<i64> = row.get("last_ingest");
            let when = match last_ingest {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<32} {:<16} {:>8}   {}",
                row.get::<String, _>("source_file"),
                row.get::<String, _>("category"),
                row.get::<i64, _>("passage_count"),
                when
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
