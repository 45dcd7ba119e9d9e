//! Crawling session
//!
//! One session executes one submission: it owns a frontier seeded with the
//! submission's inputs, cyclically applies every registered processor to the
//! frontier in parallel batches, accumulates outputs in its context, and
//! finishes by handing a `CrawlingResult` to the result store.
//!
//! Concurrency model:
//! - one coordination task per session, spawned by `init()`
//! - one tokio task per (input x processor) pair inside a batch, so a
//!   panicking or slow processor never takes the batch down with it
//! - batches are joined before the next batch is removed, bounding peak
//!   parallelism to `batch_size * processors`
//! - every sub-task races the session's cancellation token, so `destroy()`
//!   tears the whole tree down at the next suspension point

pub mod events;

pub use events::{SessionEvent, SessionEventListener};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{CrawlError, Result};
use crate::frontier::{Frontier, FrontierItem, TraversalAlgorithm};
use crate::model::{
    CrawlingContext, CrawlingDuration, CrawlingInput, CrawlingResult, ProcessorOutput,
    StoredOutput,
};
use crate::processor::{InputProcessor, ProcessorKind};
use crate::store::CrawlingResultStore;
use crate::throttle::Throttler;

/// Immutable configuration of one session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Normalized, deduplicated seeds; non-empty
    pub initial_inputs: Vec<String>,
    /// Registered processors; non-empty
    pub processors: Vec<Arc<dyn InputProcessor>>,
    /// Store receiving the final result
    pub store: Arc<dyn CrawlingResultStore>,
    /// Shared throttler serializing per-processor call starts
    pub throttler: Arc<Throttler>,
    /// Frontier ordering
    pub algorithm: TraversalAlgorithm,
    /// Items removed from the frontier per batch; >= 1
    pub batch_size: usize,
    /// Inputs at this depth or beyond are stored but not re-enqueued; >= 1
    pub max_crawl_depth: usize,
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_inputs.is_empty() {
            return Err(CrawlError::InvalidArgument(
                "initial inputs must not be empty".into(),
            ));
        }
        if self.initial_inputs.iter().any(|s| s.trim().is_empty()) {
            return Err(CrawlError::InvalidArgument(
                "initial inputs must not be blank".into(),
            ));
        }
        if self.processors.is_empty() {
            return Err(CrawlError::InvalidArgument(
                "at least one processor is required".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(CrawlError::InvalidArgument(
                "batch size must be at least 1".into(),
            ));
        }
        if self.max_crawl_depth == 0 {
            return Err(CrawlError::InvalidArgument(
                "max crawl depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one processor invocation sub-task.
enum InvocationOutcome {
    /// `can_process` declined; the pair is not recorded as processed
    NotApplicable,
    /// `process` succeeded
    Produced(ProcessorOutput),
    /// `process` returned an error; logged, pair counts as processed
    Failed,
    /// The session was destroyed while the invocation was pending
    Cancelled,
}

/// A long-running task executing one traversal.
pub struct Session {
    id: String,
    config: SessionConfig,
    cancel: CancellationToken,
    started: AtomicBool,
    destroyed: AtomicBool,
    listener: Mutex<Option<SessionEventListener>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Create a session. Validation is synchronous; the traversal does not
    /// start until [`Session::init`].
    pub fn new(config: SessionConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            listener: Mutex::new(None),
            task: Mutex::new(None),
        }))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Install the event sink. Replaces any previous listener.
    pub fn set_event_listener(&self, listener: SessionEventListener) {
        *lock(&self.listener) = Some(listener);
    }

    /// Spawn the traversal task. Non-blocking; `SessionStarted` is emitted
    /// from the task before any work begins. Calling twice is a no-op.
    pub fn init(self: &Arc<Self>) {
        if self.destroyed.load(Ordering::Acquire) {
            warn!("session {}: init after destroy ignored", self.id);
            return;
        }
        if self.started.swap(true, Ordering::AcqRel) {
            warn!("session {}: already initialized", self.id);
            return;
        }
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move { session.run().await });
        *lock(&self.task) = Some(handle);
    }

    /// Cancel the traversal task tree and stop event delivery. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        *lock(&self.listener) = None;
        lock(&self.task).take();
        debug!("session {}: destroyed", self.id);
    }

    fn emit(&self, event: SessionEvent) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        // Snapshot the listener so the callback runs without the lock held.
        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }

    async fn run(self: Arc<Self>) {
        let start_time_ms = chrono::Utc::now().timestamp_millis();
        info!(
            "session {}: starting with {} seed(s), batch size {}, max depth {}",
            self.id,
            self.config.initial_inputs.len(),
            self.config.batch_size,
            self.config.max_crawl_depth,
        );
        self.emit(SessionEvent::Started {
            session_id: self.id.clone(),
            initial_inputs: self.config.initial_inputs.clone(),
        });

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("session {}: cancelled", self.id);
                return;
            }
            outcome = self.traverse(start_time_ms) => outcome,
        };

        let duration = CrawlingDuration::since(start_time_ms);
        match outcome {
            Ok(result_id) => {
                info!(
                    "session {}: finished in {}ms, result {}",
                    self.id,
                    duration.millis(),
                    result_id
                );
                self.emit(SessionEvent::Finished {
                    session_id: self.id.clone(),
                    initial_inputs: self.config.initial_inputs.clone(),
                    result_id,
                    duration,
                });
            }
            Err(err) => {
                error!("session {}: failed: {err}", self.id);
                self.emit(SessionEvent::Failed {
                    session_id: self.id.clone(),
                    initial_inputs: self.config.initial_inputs.clone(),
                    error: err.to_string(),
                    duration,
                });
            }
        }
    }

    /// The traversal loop. Runs until the frontier drains, then saves the
    /// result; any error escaping here is terminal for the session.
    async fn traverse(&self, start_time_ms: i64) -> Result<String> {
        let mut frontier = Frontier::new(self.config.algorithm);
        for seed in &self.config.initial_inputs {
            frontier.add(FrontierItem {
                depth: 0,
                input: CrawlingInput::seed(seed.clone()),
            });
        }

        let mut context = Arc::new(CrawlingContext::new());
        let mut guard: HashSet<(ProcessorKind, String)> = HashSet::new();

        while !frontier.is_empty() {
            if self.cancel.is_cancelled() {
                return Err(CrawlError::Session("session destroyed".into()));
            }
            let batch = frontier.remove_batch(self.config.batch_size);
            let produced = self.run_batch(batch, &context, &mut guard).await;

            // Commit phase: only the coordinator touches context and
            // frontier. By now every sub-task has dropped its context
            // snapshot, so make_mut mutates in place.
            let ctx = Arc::make_mut(&mut context);
            for (depth, output) in produced {
                if depth < self.config.max_crawl_depth {
                    self.enqueue_crawlables(&mut frontier, depth, &output);
                } else {
                    debug!(
                        "session {}: depth {} at cap, storing without re-enqueue",
                        self.id, depth
                    );
                }
                ctx.commit(StoredOutput::from(&output));
            }
        }

        // A destroyed session must not persist anything.
        if self.cancel.is_cancelled() {
            return Err(CrawlError::Session("session destroyed".into()));
        }

        let result = CrawlingResult {
            initial_inputs: self.config.initial_inputs.clone(),
            outputs: Arc::try_unwrap(context)
                .unwrap_or_else(|shared| (*shared).clone())
                .into_outputs(),
            crawling_start_time_ms: start_time_ms,
            crawling_end_time_ms: chrono::Utc::now()
                .timestamp_millis()
                .max(start_time_ms + 1),
        };

        self.config
            .store
            .save(result)
            .await
            .map_err(CrawlError::Store)
    }

    /// Spawn one invocation task per applicable (input, processor) pair and
    /// join them all. Returns successful outputs paired with their depth
    /// (input depth + 1) and records processed pairs in the guard.
    async fn run_batch(
        &self,
        batch: Vec<FrontierItem>,
        context: &Arc<CrawlingContext>,
        guard: &mut HashSet<(ProcessorKind, String)>,
    ) -> Vec<(usize, ProcessorOutput)> {
        let mut meta = Vec::new();
        let mut handles = Vec::new();
        // Pairs already spawned for this batch; keeps process() at-most-once
        // even when one batch carries duplicate raw inputs.
        let mut in_flight: HashSet<(ProcessorKind, String)> = HashSet::new();

        for item in batch {
            for processor in &self.config.processors {
                let kind = ProcessorKind::of_instance(&**processor);
                let key = (kind, item.input.raw_input.clone());
                if guard.contains(&key) || !in_flight.insert(key) {
                    debug!(
                        "session {}: skipping already-processed '{}' for {}",
                        self.id,
                        item.input.raw_input,
                        processor.source().name
                    );
                    continue;
                }

                meta.push((item.depth, kind, item.input.raw_input.clone()));
                handles.push(tokio::spawn(invoke_processor(
                    Arc::clone(processor),
                    item.input.clone(),
                    Arc::clone(context),
                    Arc::clone(&self.config.throttler),
                    self.cancel.child_token(),
                )));
            }
        }

        let results = futures::future::join_all(handles).await;

        let mut produced = Vec::new();
        for ((depth, kind, raw_input), joined) in meta.into_iter().zip(results) {
            match joined {
                Ok(InvocationOutcome::Produced(output)) => {
                    guard.insert((kind, raw_input));
                    produced.push((depth + 1, output));
                }
                Ok(InvocationOutcome::Failed) => {
                    guard.insert((kind, raw_input));
                }
                Ok(InvocationOutcome::NotApplicable | InvocationOutcome::Cancelled) => {}
                Err(join_err) => {
                    // A panicking processor is contained here; the pair is
                    // not recorded as processed.
                    error!(
                        "session {}: invocation task for '{raw_input}' panicked: {join_err}",
                        self.id
                    );
                }
            }
        }
        produced
    }

    /// Route the crawlable values of `output` back into the frontier at
    /// `depth`. Values are trimmed; blank values are dropped.
    fn enqueue_crawlables(&self, frontier: &mut Frontier, depth: usize, output: &ProcessorOutput) {
        for record in &output.data {
            for holder in record.values() {
                if !holder.crawlable {
                    continue;
                }
                let value = holder.value.trim();
                if value.is_empty() {
                    debug!("session {}: dropping blank crawlable value", self.id);
                    continue;
                }
                frontier.add(FrontierItem {
                    depth,
                    input: CrawlingInput::new(output.source.clone(), value),
                });
            }
        }
    }
}

/// One processor invocation, raced against session cancellation.
async fn invoke_processor(
    processor: Arc<dyn InputProcessor>,
    input: CrawlingInput,
    context: Arc<CrawlingContext>,
    throttler: Arc<Throttler>,
    cancel: CancellationToken,
) -> InvocationOutcome {
    tokio::select! {
        _ = cancel.cancelled() => InvocationOutcome::Cancelled,
        outcome = run_invocation(processor, input, context, throttler) => outcome,
    }
}

async fn run_invocation(
    processor: Arc<dyn InputProcessor>,
    input: CrawlingInput,
    context: Arc<CrawlingContext>,
    throttler: Arc<Throttler>,
) -> InvocationOutcome {
    if !processor.can_process(&input, &context).await {
        return InvocationOutcome::NotApplicable;
    }

    throttler
        .throttle(ProcessorKind::of_instance(&*processor))
        .await;

    match processor.process(&input, &context).await {
        Ok(output) => {
            debug!(
                "processor '{}' produced {} record(s) for '{}'",
                processor.source().name,
                output.data.len(),
                input.raw_input
            );
            InvocationOutcome::Produced(output)
        }
        Err(err) => {
            warn!(
                "processor '{}' failed on '{}': {err:#}",
                processor.source().name,
                input.raw_input
            );
            InvocationOutcome::Failed
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
