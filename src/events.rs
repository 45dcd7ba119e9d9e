//! Client-visible crawl events
//!
//! The observable contract of the engine: one terminal event per accepted
//! submission, delivered to the configured listener. Listener callbacks run
//! on whichever engine task delivers them; callers must not block in them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::CrawlingDuration;

/// Terminal outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlEvent {
    /// The session drained its frontier and its result was stored
    CrawlingFinished {
        initial_inputs: Vec<String>,
        crawling_result_id: String,
        duration: CrawlingDuration,
    },
    /// The session aborted; no result was stored
    CrawlingFailed {
        initial_inputs: Vec<String>,
        error: String,
        duration: CrawlingDuration,
    },
}

impl CrawlEvent {
    /// The submission's seeds, whichever way it ended.
    #[must_use]
    pub fn initial_inputs(&self) -> &[String] {
        match self {
            Self::CrawlingFinished { initial_inputs, .. }
            | Self::CrawlingFailed { initial_inputs, .. } => initial_inputs,
        }
    }

    /// Wall-clock bounds of the session, whichever way it ended.
    #[must_use]
    pub fn duration(&self) -> CrawlingDuration {
        match self {
            Self::CrawlingFinished { duration, .. } | Self::CrawlingFailed { duration, .. } => {
                *duration
            }
        }
    }
}

/// Sink for client-visible events.
pub type CrawlEventListener = Arc<dyn Fn(CrawlEvent) + Send + Sync>;
