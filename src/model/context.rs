//! Accumulated session context
//!
//! The context holds every output the traversal loop has committed so far,
//! in commit order. Processors receive it read-only during invocation and
//! may query prior outputs to decide whether and how to process an input.

use super::StoredOutput;

/// Insertion-ordered collection of committed outputs with query helpers.
///
/// Mutated only by the session's coordination task between batches; shared
/// with in-flight invocations as an immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct CrawlingContext {
    outputs: Vec<StoredOutput>,
}

impl CrawlingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All committed outputs, in commit order.
    #[must_use]
    pub fn all(&self) -> &[StoredOutput] {
        &self.outputs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Outputs produced by the processor source with the given id.
    pub fn by_source_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a StoredOutput> {
        self.outputs.iter().filter(move |o| o.source.id == id)
    }

    /// Outputs produced by any processor source with the given name.
    pub fn by_source_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a StoredOutput> {
        self.outputs.iter().filter(move |o| o.source.name == name)
    }

    /// Every value recorded under `key`, flattened across all outputs and
    /// records, in commit order.
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<String> {
        self.outputs
            .iter()
            .flat_map(|o| o.data.iter())
            .filter_map(|record| record.get(key).cloned())
            .collect()
    }

    /// Whether any record holds `value` under `key`.
    #[must_use]
    pub fn contains_value(&self, key: &str, value: &str) -> bool {
        self.outputs
            .iter()
            .flat_map(|o| o.data.iter())
            .any(|record| record.get(key).is_some_and(|v| v == value))
    }

    pub(crate) fn commit(&mut self, output: StoredOutput) {
        self.outputs.push(output);
    }

    /// Consume the context into its outputs, preserving commit order.
    pub(crate) fn into_outputs(self) -> Vec<StoredOutput> {
        self.outputs
    }
}
