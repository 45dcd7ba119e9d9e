//! Crawler configuration
//!
//! Built through [`CrawlerConfig::builder`]; validation happens once,
//! synchronously, at `build()`. Violations surface as
//! `CrawlError::InvalidArgument`.

use std::sync::Arc;

use crate::error::{CrawlError, Result};
use crate::events::CrawlEventListener;
use crate::frontier::TraversalAlgorithm;
use crate::processor::InputProcessor;
use crate::session::{Session, SessionConfig};
use crate::store::CrawlingResultStore;
use crate::throttle::ThrottleConfig;

/// Default bound on concurrently running sessions.
pub const DEFAULT_SESSION_PARALLELISM: usize = 10;

/// Default number of frontier items removed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Constructs sessions for the dispatcher; replaceable for tests.
pub type SessionFactory = Arc<dyn Fn(SessionConfig) -> Result<Arc<Session>> + Send + Sync>;

/// Validated dispatcher configuration.
#[derive(Clone)]
pub struct CrawlerConfig {
    pub(crate) processors: Vec<Arc<dyn InputProcessor>>,
    pub(crate) store: Arc<dyn CrawlingResultStore>,
    pub(crate) session_parallelism: usize,
    pub(crate) batch_size: usize,
    pub(crate) max_crawl_depth: usize,
    pub(crate) algorithm: TraversalAlgorithm,
    pub(crate) throttle: ThrottleConfig,
    pub(crate) event_listener: Option<CrawlEventListener>,
    pub(crate) session_factory: SessionFactory,
}

impl CrawlerConfig {
    /// Start building a config from its two required pieces.
    pub fn builder(
        processors: Vec<Arc<dyn InputProcessor>>,
        store: Arc<dyn CrawlingResultStore>,
    ) -> CrawlerConfigBuilder {
        CrawlerConfigBuilder {
            processors,
            store,
            session_parallelism: DEFAULT_SESSION_PARALLELISM,
            batch_size: DEFAULT_BATCH_SIZE,
            max_crawl_depth: usize::MAX,
            algorithm: TraversalAlgorithm::default(),
            throttle: ThrottleConfig::default(),
            event_listener: None,
            session_factory: None,
        }
    }
}

/// Builder for [`CrawlerConfig`].
pub struct CrawlerConfigBuilder {
    processors: Vec<Arc<dyn InputProcessor>>,
    store: Arc<dyn CrawlingResultStore>,
    session_parallelism: usize,
    batch_size: usize,
    max_crawl_depth: usize,
    algorithm: TraversalAlgorithm,
    throttle: ThrottleConfig,
    event_listener: Option<CrawlEventListener>,
    session_factory: Option<SessionFactory>,
}

impl CrawlerConfigBuilder {
    /// Bound on concurrently running sessions; overflow submissions queue.
    #[must_use]
    pub fn session_parallelism(mut self, parallelism: usize) -> Self {
        self.session_parallelism = parallelism;
        self
    }

    /// Frontier items removed per batch. Peak parallelism inside one
    /// session is `batch_size * processors`.
    #[must_use]
    pub fn input_processing_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Depth bound; inputs at this depth are stored but not re-enqueued.
    /// The default (`usize::MAX`) is effectively no limit.
    #[must_use]
    pub fn max_crawl_depth(mut self, depth: usize) -> Self {
        self.max_crawl_depth = depth;
        self
    }

    /// Frontier ordering for every session.
    #[must_use]
    pub fn traversal_algorithm(mut self, algorithm: TraversalAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Throttling policy; one shared throttler spans all sessions.
    #[must_use]
    pub fn throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    /// Sink for client-visible events.
    #[must_use]
    pub fn event_listener(mut self, listener: CrawlEventListener) -> Self {
        self.event_listener = Some(listener);
        self
    }

    /// Replace session construction, e.g. to observe it in tests.
    #[must_use]
    pub fn session_factory(mut self, factory: SessionFactory) -> Self {
        self.session_factory = Some(factory);
        self
    }

    /// Validate and produce the config.
    pub fn build(self) -> Result<CrawlerConfig> {
        if self.processors.is_empty() {
            return Err(CrawlError::InvalidArgument(
                "at least one processor is required".into(),
            ));
        }
        if self.session_parallelism == 0 {
            return Err(CrawlError::InvalidArgument(
                "session parallelism must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(CrawlError::InvalidArgument(
                "input processing batch size must be at least 1".into(),
            ));
        }
        if self.max_crawl_depth == 0 {
            return Err(CrawlError::InvalidArgument(
                "max crawl depth must be at least 1".into(),
            ));
        }

        Ok(CrawlerConfig {
            processors: self.processors,
            store: self.store,
            session_parallelism: self.session_parallelism,
            batch_size: self.batch_size,
            max_crawl_depth: self.max_crawl_depth,
            algorithm: self.algorithm,
            throttle: self.throttle,
            event_listener: self.event_listener,
            session_factory: self.session_factory.unwrap_or_else(default_session_factory),
        })
    }
}

fn default_session_factory() -> SessionFactory {
    Arc::new(Session::new)
}
