//! JSON-file result store
//!
//! Persists each result as one pretty-printed `<id>.json` file in a
//! configured directory. The serialized shape is the crate's reference
//! format: `{initialInputs, outputs, crawlingStartTimeMs, crawlingEndTimeMs}`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::CrawlingResultStore;
use crate::model::CrawlingResult;

/// Stores one JSON file per result under a base directory.
#[derive(Debug)]
pub struct JsonFileResultStore {
    dir: PathBuf,
}

impl JsonFileResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_result(path: &Path) -> Result<CrawlingResult> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("malformed result file {}", path.display()))
    }
}

#[async_trait]
impl CrawlingResultStore for JsonFileResultStore {
    async fn save(&self, result: CrawlingResult) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let path = self.path_for(&id);
        let json = serde_json::to_string_pretty(&result).context("result serialization failed")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        debug!("Saved crawling result to {}", path.display());
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CrawlingResult>> {
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(Self::read_result(&path).await?))
    }

    async fn get_all(&self) -> Result<Vec<CrawlingResult>> {
        let mut results = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // A store that has never saved is simply empty.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(results),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to list {}", self.dir.display()));
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                results.push(Self::read_result(&path).await?);
            }
        }
        Ok(results)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }

    async fn delete_all(&self) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to list {}", self.dir.display()));
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path)
                    .await
                    .with_context(|| format!("failed to delete {}", path.display()))?;
            }
        }
        Ok(())
    }
}
