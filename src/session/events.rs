//! Session lifecycle events

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::CrawlingDuration;

/// Lifecycle events emitted by one session. `Finished` and `Failed` are
/// terminal; exactly one of them is emitted unless the session is destroyed
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Emitted from the traversal task before any work begins
    Started {
        session_id: String,
        initial_inputs: Vec<String>,
    },
    /// The frontier drained and the result was stored under `result_id`
    Finished {
        session_id: String,
        initial_inputs: Vec<String>,
        result_id: String,
        duration: CrawlingDuration,
    },
    /// The traversal or the result store failed
    Failed {
        session_id: String,
        initial_inputs: Vec<String>,
        error: String,
        duration: CrawlingDuration,
    },
}

impl SessionEvent {
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Started { session_id, .. }
            | Self::Finished { session_id, .. }
            | Self::Failed { session_id, .. } => session_id,
        }
    }
}

/// Sink for session events.
pub type SessionEventListener = Arc<dyn Fn(SessionEvent) + Send + Sync>;
