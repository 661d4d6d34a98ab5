//! Source document loader.
//!
//! Reads every configured source document from the content root. A missing
//! file is fatal to the whole run: downstream counts are reported as totals,
//! so the pipeline never proceeds with partial source material.

use crate::config::Config;
use crate::error::IngestError;
use crate::models::SourceDocument;

/// Load all expected source documents, in config order.
///
/// Fails with [`IngestError::DocumentNotFound`] on the first missing file,
/// before any segmentation or embedding work happens.
pub fn load_documents(config: &Config) -> Result<Vec<SourceDocument>, IngestError> {
    let root = &config.sources.root;
    let mut documents = Vec::with_capacity(config.sources.documents.len());

    for entry in &config.sources.documents {
        let path = root.join(&entry.file);
        if !path.is_file() {
            return Err(IngestError::DocumentNotFound { file: path });
        }

        let text = std::fs::read_to_string(&path)?;
        documents.push(SourceDocument {
            file: entry.file.clone(),
            path,
            family: entry.family,
            collection: entry.collection.clone(),
            text,
        });
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, SourceDocumentConfig, SourcesConfig};
    use crate::models::DocumentFamily;

    fn config_for(root: &std::path::Path, files: &[&str]) -> Config {
        Config {
            db: DbConfig {
                path: root.join("kbi.sqlite"),
            },
            sources: SourcesConfig {
                root: root.to_path_buf(),
                documents: files
                    .iter()
                    .map(|f| SourceDocumentConfig {
                        file: f.to_string(),
                        family: DocumentFamily::Tactics,
                        collection: "coaching".to_string(),
                        file_number: None,
                    })
                    .collect(),
            },
            chunking: Default::default(),
            embedding: Default::default(),
            routing: Default::default(),
            report: Default::default(),
        }
    }

    #[test]
    fn test_loads_all_expected_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "T001: one\nBody.").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "T002: two\nBody.").unwrap();

        let docs = load_documents(&config_for(tmp.path(), &["a.txt", "b.txt"])).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].file, "a.txt");
        assert!(docs[1].text.contains("T002"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "T001: one").unwrap();

        let err = load_documents(&config_for(tmp.path(), &["a.txt", "gone.txt"])).unwrap_err();
        match err {
            IngestError::DocumentNotFound { file } => {
                assert!(file.ends_with("gone.txt"));
            }
            other => panic!("expected DocumentNotFound, got {other:?}"),
        }
    }
}
