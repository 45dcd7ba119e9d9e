//! driftnet: a generic, extensible crawling engine
//!
//! The engine exhaustively derives data from seed strings by feeding every
//! discovered value back through a bank of pluggable [`InputProcessor`]s.
//! It is domain-agnostic: processors may crawl web pages, query APIs, read
//! filesystems or download media; the engine only dispatches, traverses,
//! throttles and deduplicates.
//!
//! ```no_run
//! use std::sync::Arc;
//! use driftnet::{Crawler, CrawlerConfig, InMemoryResultStore};
//! # use driftnet::InputProcessor;
//!
//! # async fn example(processors: Vec<Arc<dyn InputProcessor>>) -> driftnet::Result<()> {
//! let store = Arc::new(InMemoryResultStore::new());
//! let config = CrawlerConfig::builder(processors, store)
//!     .session_parallelism(4)
//!     .max_crawl_depth(3)
//!     .build()?;
//!
//! let crawler = Crawler::new(config);
//! crawler.submit(["johny123"])?;
//! # Ok(())
//! # }
//! ```

pub mod crawler;
pub mod error;
pub mod events;
pub mod frontier;
pub mod model;
pub mod processor;
pub mod session;
pub mod store;
pub mod throttle;

pub use crawler::{Crawler, CrawlerConfig, CrawlerConfigBuilder, SessionFactory};
pub use error::{CrawlError, Result};
pub use events::{CrawlEvent, CrawlEventListener};
pub use frontier::{Frontier, FrontierItem, TraversalAlgorithm};
pub use model::{
    CrawlingContext, CrawlingDuration, CrawlingInput, CrawlingResult, ProcessorOutput, Record,
    Source, StoredOutput, StoredRecord, ValueHolder,
};
pub use processor::{InputProcessor, ProcessorKind};
pub use session::{Session, SessionConfig, SessionEvent, SessionEventListener};
pub use store::{CrawlingResultStore, InMemoryResultStore, JsonFileResultStore};
pub use throttle::{ThrottleConfig, Throttler};
