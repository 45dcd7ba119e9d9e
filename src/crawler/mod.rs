//! Crawler dispatcher
//!
//! The top-level entry point. Accepts seed submissions, bounds the number of
//! concurrently running sessions, queues overflow submissions FIFO, destroys
//! finished sessions and promotes queued submissions into the freed slots,
//! and translates session events into the client-visible [`CrawlEvent`]s.
//!
//! All dispatcher state lives behind one mutex; nothing blocks while holding
//! it (session `init()` only spawns), so `active <= parallelism` holds at
//! every observation point.

pub mod config;

pub use config::{
    CrawlerConfig, CrawlerConfigBuilder, SessionFactory, DEFAULT_BATCH_SIZE,
    DEFAULT_SESSION_PARALLELISM,
};

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, error, info};

use crate::error::{CrawlError, Result};
use crate::events::CrawlEvent;
use crate::session::{Session, SessionConfig, SessionEvent};
use crate::throttle::Throttler;

/// The dispatcher. Cheap to clone handles are not provided; share it with
/// `Arc` if multiple submitters need it.
pub struct Crawler {
    shared: Arc<CrawlerShared>,
}

struct CrawlerShared {
    config: CrawlerConfig,
    throttler: Arc<Throttler>,
    state: Mutex<DispatcherState>,
}

#[derive(Default)]
struct DispatcherState {
    active: HashMap<String, Arc<Session>>,
    pending: VecDeque<Vec<String>>,
    shut_down: bool,
}

impl Crawler {
    /// Create a dispatcher from a validated config.
    #[must_use]
    pub fn new(config: CrawlerConfig) -> Self {
        let throttler = Arc::new(Throttler::new(config.throttle.clone()));
        Self {
            shared: Arc::new(CrawlerShared {
                config,
                throttler,
                state: Mutex::new(DispatcherState::default()),
            }),
        }
    }

    /// Submit a set of seeds as one crawling session.
    ///
    /// Seeds are trimmed and deduplicated (order-preserving); a blank seed
    /// or an empty set is `InvalidArgument`. When every session slot is
    /// taken the submission queues and starts later, in arrival order.
    ///
    /// Must be called within a tokio runtime: starting a session spawns its
    /// traversal task.
    pub fn submit<I, S>(&self, seeds: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let seeds = normalize_seeds(seeds)?;

        let mut state = lock(&self.shared.state);
        if state.shut_down {
            return Err(CrawlError::ShutDown);
        }
        if state.active.len() >= self.shared.config.session_parallelism {
            debug!(
                "session parallelism {} reached, queueing submission of {} seed(s)",
                self.shared.config.session_parallelism,
                seeds.len()
            );
            state.pending.push_back(seeds);
            return Ok(());
        }
        self.shared.start_session(&mut state, seeds)
    }

    /// Destroy every active session and refuse further submissions.
    /// Idempotent. Pending submissions are discarded; in-flight processor
    /// calls that ignore cancellation may briefly outlive this call, and
    /// their results are discarded.
    pub fn shutdown(&self) {
        let sessions: Vec<Arc<Session>> = {
            let mut state = lock(&self.shared.state);
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            state.pending.clear();
            state.active.drain().map(|(_, session)| session).collect()
        };

        // Destroy outside the lock: destroy() touches per-session state and
        // nothing here depends on dispatcher state anymore.
        for session in &sessions {
            session.destroy();
        }
        info!("crawler shut down, {} active session(s) destroyed", sessions.len());
    }

    /// Number of currently running sessions.
    #[must_use]
    pub fn active_session_count(&self) -> usize {
        lock(&self.shared.state).active.len()
    }

    /// Number of submissions waiting for a free session slot.
    #[must_use]
    pub fn pending_submission_count(&self) -> usize {
        lock(&self.shared.state).pending.len()
    }
}

impl CrawlerShared {
    /// Create, register and start a session for `seeds`. Caller holds the
    /// state lock; `init()` is non-blocking so that is fine.
    fn start_session(
        self: &Arc<Self>,
        state: &mut DispatcherState,
        seeds: Vec<String>,
    ) -> Result<()> {
        let session_config = SessionConfig {
            initial_inputs: seeds,
            processors: self.config.processors.clone(),
            store: Arc::clone(&self.config.store),
            throttler: Arc::clone(&self.throttler),
            algorithm: self.config.algorithm,
            batch_size: self.config.batch_size,
            max_crawl_depth: self.config.max_crawl_depth,
        };

        let session = (self.config.session_factory)(session_config)?;
        let session_id = session.id().to_string();

        let shared = Arc::downgrade(self);
        session.set_event_listener(Arc::new(move |event| {
            if let Some(shared) = Weak::upgrade(&shared) {
                shared.on_session_event(event);
            }
        }));

        state.active.insert(session_id.clone(), Arc::clone(&session));
        session.init();
        info!("started crawling session {session_id}");
        Ok(())
    }

    /// Runs on the session task delivering a terminal event: free the slot,
    /// notify the client, promote the next queued submission.
    fn on_session_event(self: &Arc<Self>, event: SessionEvent) {
        let (session_id, client_event) = match event {
            SessionEvent::Started { session_id, .. } => {
                debug!("session {session_id} started");
                return;
            }
            SessionEvent::Finished {
                session_id,
                initial_inputs,
                result_id,
                duration,
            } => (
                session_id,
                CrawlEvent::CrawlingFinished {
                    initial_inputs,
                    crawling_result_id: result_id,
                    duration,
                },
            ),
            SessionEvent::Failed {
                session_id,
                initial_inputs,
                error,
                duration,
            } => (
                session_id,
                CrawlEvent::CrawlingFailed {
                    initial_inputs,
                    error,
                    duration,
                },
            ),
        };

        {
            let mut state = lock(&self.state);
            if state.shut_down {
                return;
            }

            if let Some(session) = state.active.remove(&session_id) {
                session.destroy();
            }

            if let Some(seeds) = state.pending.pop_front() {
                debug!("promoting queued submission of {} seed(s)", seeds.len());
                if let Err(err) = self.start_session(&mut state, seeds) {
                    error!("failed to promote queued submission: {err}");
                }
            }
        }

        // Deliver outside the lock so a listener may submit follow-up work.
        if let Some(listener) = &self.config.event_listener {
            listener(client_event);
        }
    }
}

impl Drop for Crawler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn normalize_seeds<I, S>(seeds: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut normalized = Vec::new();
    let mut seen = HashSet::new();
    for seed in seeds {
        let seed = seed.into();
        let trimmed = seed.trim();
        if trimmed.is_empty() {
            return Err(CrawlError::InvalidArgument(
                "seeds must not be blank".into(),
            ));
        }
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }
    if normalized.is_empty() {
        return Err(CrawlError::InvalidArgument(
            "at least one seed is required".into(),
        ));
    }
    Ok(normalized)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
