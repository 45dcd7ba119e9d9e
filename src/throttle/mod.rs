//! Per-processor call throttling
//!
//! Serializes the start times of remote-facing processor calls: each
//! processor identity gets a ladder of scheduled start times spaced by its
//! configured delay, so a processor keeps a steady outbound rate no matter
//! how many session tasks compete for it.
//!
//! The locked section touches only the bookkeeping map; the wait itself
//! happens outside the lock, so throttling never serializes throughput.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::processor::ProcessorKind;

/// Throttling policy for a crawler or session.
#[derive(Debug, Clone, Default)]
pub enum ThrottleConfig {
    /// No delay; `throttle` returns immediately (the default)
    #[default]
    None,
    /// One delay applied to every processor, with per-identity bookkeeping
    Fixed(Duration),
    /// Per-processor delays keyed by concrete type, with a fallback for
    /// unmapped processors
    PerProcessor {
        delays: HashMap<ProcessorKind, Duration>,
        fallback: Duration,
    },
}

impl ThrottleConfig {
    /// Per-processor config with a zero-delay fallback.
    #[must_use]
    pub fn per_processor(delays: HashMap<ProcessorKind, Duration>) -> Self {
        Self::PerProcessor {
            delays,
            fallback: Duration::ZERO,
        }
    }

    fn delay_for(&self, kind: ProcessorKind) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => *delay,
            Self::PerProcessor { delays, fallback } => {
                delays.get(&kind).copied().unwrap_or(*fallback)
            }
        }
    }
}

/// Enforces minimum spacing between successive processor call starts.
///
/// Shared by every session of a crawler, so the spacing holds across
/// concurrent sessions too.
#[derive(Debug)]
pub struct Throttler {
    config: ThrottleConfig,
    next_start: Mutex<HashMap<ProcessorKind, Instant>>,
}

impl Throttler {
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            next_start: Mutex::new(HashMap::new()),
        }
    }

    /// Suspend the caller until the processor's next permitted start time.
    ///
    /// Infallible. This call's effective start is `max(now, next permitted
    /// start)`; that start plus the delay is booked as the identity's next
    /// permitted start, and the sleep happens outside the lock. The first
    /// call on an identity is admitted immediately.
    pub async fn throttle(&self, kind: ProcessorKind) {
        let delay = self.config.delay_for(kind);
        if delay.is_zero() {
            return;
        }

        let wait = {
            let mut next_start = self
                .next_start
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();
            let start = next_start.get(&kind).map_or(now, |t| (*t).max(now));
            next_start.insert(kind, start + delay);
            start.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
