//! In-memory result store

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use super::CrawlingResultStore;
use crate::model::CrawlingResult;

/// Keeps results in a concurrent map for the lifetime of the process.
///
/// The default store for tests and short-lived crawls.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: DashMap<String, CrawlingResult>,
}

impl InMemoryResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[async_trait]
impl CrawlingResultStore for InMemoryResultStore {
    async fn save(&self, result: CrawlingResult) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.results.insert(id.clone(), result);
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CrawlingResult>> {
        Ok(self.results.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_all(&self) -> Result<Vec<CrawlingResult>> {
        Ok(self
            .results
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.results.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        self.results.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> CrawlingResult {
        CrawlingResult {
            initial_inputs: vec!["seed".into()],
            outputs: vec![],
            crawling_start_time_ms: 1,
            crawling_end_time_ms: 2,
        }
    }

    #[tokio::test]
    async fn save_and_fetch_round_trip() {
        let store = InMemoryResultStore::new();
        let id = store.save(sample_result()).await.unwrap();

        let fetched = store.get_by_id(&id).await.unwrap();
        assert_eq!(fetched, Some(sample_result()));
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_operations() {
        let store = InMemoryResultStore::new();
        let id = store.save(sample_result()).await.unwrap();
        store.save(sample_result()).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 2);

        store.delete_by_id(&id).await.unwrap();
        assert_eq!(store.len(), 1);

        store.delete_all().await.unwrap();
        assert!(store.is_empty());
    }
}
