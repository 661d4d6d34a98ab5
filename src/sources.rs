use anyhow::Result;

use crate::config::Config;

/// List every configured source document with its on-disk status. A file
/// reported MISSING here would abort an ingestion run before any API call.
pub fn list_sources(config: &Config) -> Result<()> {
    println!(
        "{:<32} {:<12} {:<16} {:<10} {}",
        "FILE", "FAMILY", "COLLECTION", "STATUS", "SIZE"
    );

    for doc in &config.sources.documents {
        let path = config.sources.root.join(&doc.file);
        let (status, size) = match std::fs::metadata(&path) {
            Ok(meta) => ("OK", format!("{} B", meta.len())),
            Err(_) => ("MISSING", "-".to_string()),
        };
        println!(
            "{:<32} {:<12} {:<16} {:<10} {}",
            doc.file,
            doc.family.as_str(),
            doc.collection,
            status,
            size
        );
    }

    Ok(())
}
