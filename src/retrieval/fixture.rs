//! Fixture-backed retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{DocumentSearch, RetrievalMode, apply_top_k};
use crate::types::{Document, GuideError, Result};

/// Both on-disk layouts: a bare array or `{"docs": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Docs(Vec<Document>),
    Wrapped { docs: Vec<Document> },
}

impl FixtureFile {
    fn into_docs(self) -> Vec<Document> {
        match self {
            FixtureFile::Docs(docs) | FixtureFile::Wrapped { docs } => docs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixtureSearch {
    dir: PathBuf,
}

impl FixtureSearch {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Table names map straight to file names, so reject anything path-like
    fn fixture_path(&self, table_name: &str) -> Option<PathBuf> {
        let valid = !table_name.is_empty()
            && !table_name.starts_with('.')
            && !table_name.contains(['/', '\\']);
        valid.then(|| self.dir.join(format!("{}.json", table_name)))
    }
}

#[async_trait]
impl DocumentSearch for FixtureSearch {
    async fn search(&self, table_name: &str, top_k: Option<usize>) -> Result<Vec<Document>> {
        let path = self
            .fixture_path(table_name)
            .ok_or_else(|| GuideError::not_found(table_name))?;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GuideError::not_found(table_name));
            }
            Err(e) => return Err(e.into()),
        };

        let docs = read_fixture(&path, &raw)?;
        debug!(table = table_name, docs = docs.len(), "Loaded fixture documents");
        Ok(apply_top_k(docs, top_k))
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::Stub
    }
}

fn read_fixture(path: &Path, raw: &str) -> Result<Vec<Document>> {
    serde_json::from_str::<FixtureFile>(raw)
        .map(FixtureFile::into_docs)
        .map_err(|e| GuideError::Retrieval(format!("Invalid fixture {}: {}", path.display(), e)))
}

// =============================================================================
// Fixtures index
// =============================================================================

/// Best-effort metadata for one fixture table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureTable {
    pub name: String,
    pub title: String,
    pub description: String,
    pub doc_count: usize,
}

/// List fixture tables sorted by name.
///
/// Unreadable entries are kept with empty metadata; a missing directory is empty.
pub async fn fixtures_index(dir: &Path) -> Result<Vec<FixtureTable>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut tables = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let docs = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => read_fixture(&path, &raw),
            Err(e) => Err(e.into()),
        };

        let table = match docs {
            Ok(docs) => FixtureTable {
                name: name.to_string(),
                title: docs.first().map(|d| d.title.clone()).unwrap_or_default(),
                description: docs
                    .first()
                    .map(|d| d.description.clone())
                    .unwrap_or_default(),
                doc_count: docs.len(),
            },
            Err(e) => {
                warn!("Skipping metadata for fixture {}: {}", path.display(), e);
                FixtureTable {
                    name: name.to_string(),
                    title: String::new(),
                    description: String::new(),
                    doc_count: 0,
                }
            }
        };
        tables.push(table);
    }

    tables.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/glean")
    }

    fn doc_json(id: &str) -> String {
        format!(
            r#"{{"doc_id": "{id}", "title": "T {id}", "doc_type": "wiki", "table_name": "x.Y",
                "description": "d {id}", "tags": [], "url": "https://wiki/{id}"}}"#
        )
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let search = FixtureSearch::new(repo_fixtures());
        let err = search.search("nope.Missing", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_path_like_names_are_not_found() {
        let search = FixtureSearch::new(repo_fixtures());
        for name in ["../Cargo", "a/b", "", ".hidden"] {
            assert!(search.search(name, None).await.unwrap_err().is_not_found());
        }
    }

    #[tokio::test]
    async fn test_top_k_semantics() {
        let search = FixtureSearch::new(repo_fixtures());
        let all = search.search("tracking.AdClickEvent", None).await.unwrap();
        assert!(all.len() >= 3);

        let none = search.search("tracking.AdClickEvent", Some(0)).await.unwrap();
        assert!(none.is_empty());

        let many = search
            .search("tracking.AdClickEvent", Some(all.len() + 10))
            .await
            .unwrap();
        assert_eq!(many, all);

        let two = search.search("tracking.AdClickEvent", Some(2)).await.unwrap();
        assert_eq!(two[..], all[..2]);
    }

    #[tokio::test]
    async fn test_wrapped_layout_and_invalid_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("a.Wrapped.json"),
            format!(r#"{{"docs": [{}, {}]}}"#, doc_json("1"), doc_json("2")),
        )
        .unwrap();
        std::fs::write(dir.path().join("b.Broken.json"), "{not json").unwrap();

        let search = FixtureSearch::new(dir.path());
        let docs = search.search("a.Wrapped", None).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].doc_id, "2");

        let err = search.search("b.Broken", None).await.unwrap_err();
        assert!(matches!(err, GuideError::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_fixtures_index_tolerates_bad_entries() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("z.Good.json"),
            format!("[{}]", doc_json("1")),
        )
        .unwrap();
        std::fs::write(dir.path().join("a.Bad.json"), "[{\"doc_id\": 1}]").unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let tables = fixtures_index(dir.path()).await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "a.Bad");
        assert_eq!(tables[0].doc_count, 0);
        assert_eq!(tables[0].title, "");
        assert_eq!(tables[1].name, "z.Good");
        assert_eq!(tables[1].title, "T 1");
        assert_eq!(tables[1].doc_count, 1);
    }

    #[tokio::test]
    async fn test_fixtures_index_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let tables = fixtures_index(&dir.path().join("absent")).await.unwrap();
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_repo_fixtures_index() {
        let tables = fixtures_index(&repo_fixtures()).await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "marketing.CampaignSummary",
                "tracking.AdClickEvent",
                "tracking.PageView"
            ]
        );
        assert!(tables.iter().all(|t| t.doc_count > 0));
    }
}
