//! Traversal frontier
//!
//! Holds the pending items of one session. A single `VecDeque` backs both
//! orders: BFS dequeues at the head, DFS pops from the tail. Batch removal
//! is defined as repeated single removes, so a DFS batch comes out
//! most-recently-pushed first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::CrawlingInput;

/// Visit order for a session's traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalAlgorithm {
    /// Level-order traversal (the default)
    #[default]
    BreadthFirst,
    /// Last-in-first-out traversal
    DepthFirst,
}

/// A pending traversal item: the input plus the depth it was discovered at.
/// Seeds enter at depth 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub depth: usize,
    pub input: CrawlingInput,
}

/// Pending-item container for one session.
#[derive(Debug)]
pub struct Frontier {
    algorithm: TraversalAlgorithm,
    items: VecDeque<FrontierItem>,
}

impl Frontier {
    #[must_use]
    pub fn new(algorithm: TraversalAlgorithm) -> Self {
        Self {
            algorithm,
            items: VecDeque::new(),
        }
    }

    pub fn add(&mut self, item: FrontierItem) {
        self.items.push_back(item);
    }

    /// Remove the next item per the traversal order, if any.
    pub fn remove(&mut self) -> Option<FrontierItem> {
        match self.algorithm {
            TraversalAlgorithm::BreadthFirst => self.items.pop_front(),
            TraversalAlgorithm::DepthFirst => self.items.pop_back(),
        }
    }

    /// Remove up to `n` items by repeated [`Frontier::remove`].
    pub fn remove_batch(&mut self, n: usize) -> Vec<FrontierItem> {
        let mut batch = Vec::with_capacity(n.min(self.items.len()));
        while batch.len() < n {
            match self.remove() {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        batch
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
