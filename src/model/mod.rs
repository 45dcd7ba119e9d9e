//! Data model for crawling inputs, outputs and results
//!
//! The model is deliberately small: processors exchange `CrawlingInput` and
//! `ProcessorOutput`, the session accumulates `StoredOutput`s (crawlability
//! already consumed) and hands a `CrawlingResult` to the result store when
//! the frontier drains.

pub mod context;

pub use context::CrawlingContext;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identity of a data source exported by a processor.
///
/// `name` is human-readable; `id` is an opaque string recommended unique per
/// processor instance. Ids produced by [`Source::new`] use the alphabet
/// `[a-z0-9-]` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub id: String,
}

impl Source {
    /// Create a source with a generated unique id of the form
    /// `<slug>-<uuid4>`, where the slug is the lowercased name with every
    /// character outside `[a-z0-9]` mapped to `-`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let id = format!("{slug}-{}", uuid::Uuid::new_v4());
        Self { name, id }
    }

    /// Create a source with an explicit id.
    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// The synthetic source that seeds enter the frontier under.
    #[must_use]
    pub fn root() -> Self {
        Self::with_id("root", "root")
    }
}

/// A value traveling through the frontier, together with the source that
/// produced it. Seeds carry [`Source::root`].
///
/// `raw_input` is always non-blank and pre-trimmed; the engine trims and
/// drops blank values before admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlingInput {
    pub source: Source,
    pub raw_input: String,
}

impl CrawlingInput {
    pub fn new(source: Source, raw_input: impl Into<String>) -> Self {
        Self {
            source,
            raw_input: raw_input.into(),
        }
    }

    /// A seed input under the synthetic root source.
    pub fn seed(raw_input: impl Into<String>) -> Self {
        Self::new(Source::root(), raw_input)
    }
}

/// An output value plus the flag deciding whether the engine may feed it
/// back through the frontier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueHolder {
    pub value: String,
    pub crawlable: bool,
}

impl ValueHolder {
    /// A value the engine re-feeds into the frontier.
    pub fn crawlable(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            crawlable: true,
        }
    }

    /// A value that is stored but never re-fed.
    pub fn uncrawlable(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            crawlable: false,
        }
    }
}

/// One ordered record of key -> value produced by a processor call.
pub type Record = IndexMap<String, ValueHolder>;

/// One ordered record after crawlability has been consumed by the engine.
pub type StoredRecord = IndexMap<String, String>;

/// Result of a successful processor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorOutput {
    /// Source of the processor that produced this output
    pub source: Source,
    /// Source of the input's origin (root for seeds)
    pub started_by: Source,
    /// The raw input the processor was fed
    pub input: String,
    /// Ordered records of extracted values
    pub data: Vec<Record>,
    /// Epoch milliseconds at creation
    pub timestamp: i64,
}

impl ProcessorOutput {
    /// Build an output for `input`, stamping provenance and the current time.
    pub fn new(source: Source, input: &CrawlingInput, data: Vec<Record>) -> Self {
        Self {
            source,
            started_by: input.source.clone(),
            input: input.raw_input.clone(),
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A committed output held by the session context. Identical to
/// [`ProcessorOutput`] except the record values are plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOutput {
    pub source: Source,
    pub started_by: Source,
    pub input: String,
    pub data: Vec<StoredRecord>,
    pub timestamp: i64,
}

impl From<&ProcessorOutput> for StoredOutput {
    fn from(output: &ProcessorOutput) -> Self {
        Self {
            source: output.source.clone(),
            started_by: output.started_by.clone(),
            input: output.input.clone(),
            data: output
                .data
                .iter()
                .map(|record| {
                    record
                        .iter()
                        .map(|(k, v)| (k.clone(), v.value.clone()))
                        .collect()
                })
                .collect(),
            timestamp: output.timestamp,
        }
    }
}

/// Start/end of a crawling session in epoch milliseconds.
///
/// `end_time_ms` is always strictly greater than `start_time_ms`; a session
/// finishing within one millisecond records `start + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlingDuration {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
}

impl CrawlingDuration {
    pub(crate) fn since(start_time_ms: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            start_time_ms,
            end_time_ms: now.max(start_time_ms + 1),
        }
    }

    /// Elapsed milliseconds.
    #[must_use]
    pub fn millis(&self) -> i64 {
        self.end_time_ms - self.start_time_ms
    }
}

/// Final product of one session: the seeds, the committed outputs in commit
/// order, and the session's wall-clock bounds. This is what result stores
/// persist; the reference JSON store serializes it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlingResult {
    pub initial_inputs: Vec<String>,
    pub outputs: Vec<StoredOutput>,
    pub crawling_start_time_ms: i64,
    pub crawling_end_time_ms: i64,
}

impl CrawlingResult {
    /// Duration view over the recorded bounds.
    #[must_use]
    pub fn duration(&self) -> CrawlingDuration {
        CrawlingDuration {
            start_time_ms: self.crawling_start_time_ms,
            end_time_ms: self.crawling_end_time_ms,
        }
    }
}
