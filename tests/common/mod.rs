//! Test fixtures for the driftnet integration suite
//!
//! Processor identity is the concrete type, so fixture processors take a
//! marker type parameter: `RuleProcessor<A>` and `RuleProcessor<B>` are two
//! distinct identities sharing one implementation.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use driftnet::{
    CrawlEvent, CrawlEventListener, CrawlingContext, CrawlingInput, CrawlingResult,
    CrawlingResultStore, InputProcessor, ProcessorOutput, Record, Source, ValueHolder,
};
use tokio::sync::mpsc;

/// One recorded `process` invocation.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ProcessCall {
    pub processor: String,
    pub input: String,
    pub at: Instant,
}

pub type CallLog = Arc<Mutex<Vec<ProcessCall>>>;

#[allow(dead_code)]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Asserts every (processor, input) pair in the log is unique.
#[allow(dead_code)]
pub fn assert_at_most_once(log: &CallLog) {
    let calls = log.lock().unwrap();
    let mut seen = HashSet::new();
    for call in calls.iter() {
        assert!(
            seen.insert((call.processor.clone(), call.input.clone())),
            "processor '{}' invoked twice on input '{}'",
            call.processor,
            call.input
        );
    }
}

/// Builds an ordered record from key/value pairs.
#[allow(dead_code)]
pub fn record(entries: &[(&str, ValueHolder)]) -> Record {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

/// A processor that matches a fixed set of raw inputs and emits configured
/// records for each. The marker `M` gives each fixture its own identity.
pub struct RuleProcessor<M: 'static> {
    source: Source,
    rules: HashMap<String, Vec<Record>>,
    log: Option<CallLog>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: 'static> RuleProcessor<M> {
    #[allow(dead_code)]
    pub fn new(name: &str) -> Self {
        Self {
            source: Source::new(name),
            rules: HashMap::new(),
            log: None,
            _marker: PhantomData,
        }
    }

    #[allow(dead_code)]
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    /// Adds a matching input and the records its output carries.
    #[allow(dead_code)]
    pub fn rule(mut self, input: &str, records: Vec<Record>) -> Self {
        self.rules.insert(input.to_string(), records);
        self
    }

    /// Shorthand: one crawlable value per record under a shared key.
    #[allow(dead_code)]
    pub fn emits(self, input: &str, key: &str, values: &[&str]) -> Self {
        let records = values
            .iter()
            .map(|value| record(&[(key, ValueHolder::crawlable(*value))]))
            .collect();
        self.rule(input, records)
    }
}

#[async_trait]
impl<M: 'static> InputProcessor for RuleProcessor<M> {
    fn source(&self) -> &Source {
        &self.source
    }

    async fn can_process(&self, input: &CrawlingInput, _context: &CrawlingContext) -> bool {
        self.rules.contains_key(&input.raw_input)
    }

    async fn process(
        &self,
        input: &CrawlingInput,
        _context: &CrawlingContext,
    ) -> Result<ProcessorOutput> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(ProcessCall {
                processor: self.source.name.clone(),
                input: input.raw_input.clone(),
                at: Instant::now(),
            });
        }
        let data = self
            .rules
            .get(&input.raw_input)
            .cloned()
            .ok_or_else(|| anyhow!("no rule for input '{}'", input.raw_input))?;
        Ok(ProcessorOutput::new(self.source.clone(), input, data))
    }
}

/// A processor whose `process` always fails.
pub struct FailingProcessor<M: 'static> {
    source: Source,
    matches: HashSet<String>,
    log: Option<CallLog>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: 'static> FailingProcessor<M> {
    #[allow(dead_code)]
    pub fn new(name: &str, matches: &[&str]) -> Self {
        Self {
            source: Source::new(name),
            matches: matches.iter().map(|s| (*s).to_string()).collect(),
            log: None,
            _marker: PhantomData,
        }
    }

    #[allow(dead_code)]
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }
}

#[async_trait]
impl<M: 'static> InputProcessor for FailingProcessor<M> {
    fn source(&self) -> &Source {
        &self.source
    }

    async fn can_process(&self, input: &CrawlingInput, _context: &CrawlingContext) -> bool {
        self.matches.contains(&input.raw_input)
    }

    async fn process(
        &self,
        input: &CrawlingInput,
        _context: &CrawlingContext,
    ) -> Result<ProcessorOutput> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(ProcessCall {
                processor: self.source.name.clone(),
                input: input.raw_input.clone(),
                at: Instant::now(),
            });
        }
        Err(anyhow!("simulated processor failure"))
    }
}

/// A processor that matches everything and holds each `process` call until
/// the test releases a permit. Used to keep sessions in flight.
pub struct GatedProcessor<M: 'static> {
    source: Source,
    gate: Arc<tokio::sync::Semaphore>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: 'static> GatedProcessor<M> {
    #[allow(dead_code)]
    pub fn new(name: &str) -> (Self, Arc<tokio::sync::Semaphore>) {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        (
            Self {
                source: Source::new(name),
                gate: Arc::clone(&gate),
                _marker: PhantomData,
            },
            gate,
        )
    }
}

#[async_trait]
impl<M: 'static> InputProcessor for GatedProcessor<M> {
    fn source(&self) -> &Source {
        &self.source
    }

    async fn can_process(&self, _input: &CrawlingInput, _context: &CrawlingContext) -> bool {
        true
    }

    async fn process(
        &self,
        input: &CrawlingInput,
        _context: &CrawlingContext,
    ) -> Result<ProcessorOutput> {
        let permit = self.gate.acquire().await?;
        permit.forget();
        Ok(ProcessorOutput::new(self.source.clone(), input, vec![]))
    }
}

/// A result store whose `save` always fails.
pub struct FailingStore;

#[async_trait]
impl CrawlingResultStore for FailingStore {
    async fn save(&self, _result: CrawlingResult) -> Result<String> {
        Err(anyhow!("store rejected the result"))
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<CrawlingResult>> {
        Ok(None)
    }

    async fn get_all(&self) -> Result<Vec<CrawlingResult>> {
        Ok(Vec::new())
    }

    async fn delete_by_id(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        Ok(())
    }
}

/// Listener feeding events into a channel the test can await.
#[allow(dead_code)]
pub fn event_channel() -> (CrawlEventListener, mpsc::UnboundedReceiver<CrawlEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: CrawlEventListener = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (listener, rx)
}

/// Awaits the next event, panicking after five seconds.
#[allow(dead_code)]
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<CrawlEvent>) -> CrawlEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for crawl event")
        .expect("event channel closed")
}

/// Waits until `check` returns true, panicking after the timeout.
#[allow(dead_code)]
pub async fn wait_for_condition<F>(mut check: F, timeout: Duration)
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for condition");
}
