//! Result store contract and reference implementations
//!
//! The engine hands each finished session's `CrawlingResult` to a store and
//! reports the returned id in the `CrawlingFinished` event. A failing `save`
//! is terminal for the session.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileResultStore;
pub use memory::InMemoryResultStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::CrawlingResult;

/// Persistence seam for crawling results. Ids are opaque strings.
///
/// Implementations must tolerate concurrent `save` calls from different
/// sessions.
#[async_trait]
pub trait CrawlingResultStore: Send + Sync {
    /// Persist a result, returning its id.
    async fn save(&self, result: CrawlingResult) -> Result<String>;

    /// Fetch a result by id, `None` when absent.
    async fn get_by_id(&self, id: &str) -> Result<Option<CrawlingResult>>;

    /// All stored results.
    async fn get_all(&self) -> Result<Vec<CrawlingResult>>;

    /// Remove a result by id; absent ids are a no-op.
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Remove every stored result.
    async fn delete_all(&self) -> Result<()>;
}
