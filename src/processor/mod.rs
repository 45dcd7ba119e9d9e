//! Input processor contract
//!
//! Processors are the pluggable edge of the engine: each one recognizes some
//! class of raw inputs (URLs, usernames, file paths) and derives new values
//! from them. The engine knows nothing beyond this contract.

use std::any::{Any, TypeId};

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{CrawlingContext, CrawlingInput, ProcessorOutput, Source};

/// A pluggable input processor.
///
/// Both `can_process` and `process` may perform I/O and take long; they run
/// inside isolated engine tasks, so a panic in either is contained and
/// logged without affecting the rest of the session. Implementations should
/// still prefer returning `Err` from `process` over panicking.
///
/// The `Any` supertrait gives the engine the concrete implementor type,
/// which keys per-processor deduplication and throttling (see
/// [`ProcessorKind`]).
#[async_trait]
pub trait InputProcessor: Any + Send + Sync {
    /// Stable identity of the data this processor exports. Recommended
    /// unique per instance; see [`Source::new`].
    fn source(&self) -> &Source;

    /// Whether this processor applies to `input`. Receives the read-only
    /// context of outputs committed so far. A `false` here is not recorded:
    /// the same input may be probed again later in the session.
    async fn can_process(&self, input: &CrawlingInput, context: &CrawlingContext) -> bool;

    /// Derive an output from `input`. An `Err` is logged by the engine and
    /// the session continues; the input counts as processed either way.
    async fn process(
        &self,
        input: &CrawlingInput,
        context: &CrawlingContext,
    ) -> Result<ProcessorOutput>;
}

/// Identity of a processor implementation: its concrete type.
///
/// Two instances of the same type share one identity, so they share throttle
/// spacing; the deduplication guard keys on `(ProcessorKind, raw_input)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessorKind(TypeId);

impl ProcessorKind {
    /// Identity of a processor type, for keying per-processor throttle maps.
    #[must_use]
    pub fn of<P: InputProcessor>() -> Self {
        Self(TypeId::of::<P>())
    }

    /// Identity of a processor instance behind the trait object.
    #[must_use]
    pub fn of_instance(processor: &dyn InputProcessor) -> Self {
        let any: &dyn Any = processor;
        Self(any.type_id())
    }
}
