//! Ordered queue of expectations for one scenario.

use crate::error::{HarnessError, Result};
use crate::expectation::{Expectation, Stage};

/// Expectations in declared order plus a cursor to the first unmet one.
///
/// Entries are never removed; satisfying the front one advances the cursor.
#[derive(Debug, Clone, Default)]
pub struct ExpectationQueue {
    items: Vec<Expectation>,
    cursor: usize,
}

impl ExpectationQueue {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }

    /// Append an expectation.
    pub fn push(&mut self, expectation: Expectation) {
        self.items.push(expectation);
    }

    /// Get the first unmet expectation.
    #[must_use]
    pub fn front(&self) -> Option<&Expectation> {
        self.items.get(self.cursor)
    }

    /// Move the front expectation to another stage.
    pub(crate) fn advance_front(&mut self, stage: Stage) {
        if let Some(front) = self.items.get_mut(self.cursor) {
            front.set_stage(stage);
        }
    }

    /// Mark the front expectation satisfied and move past it.
    pub(crate) fn satisfy_front(&mut self) -> Option<&Expectation> {
        let front = self.items.get_mut(self.cursor)?;
        front.mark_satisfied();
        self.cursor += 1;
        self.items.get(self.cursor - 1)
    }

    /// Number of expectations not yet satisfied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Total number of expectations ever queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing was ever queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Unmet expectations in declared order.
    #[must_use]
    pub fn remaining(&self) -> &[Expectation] {
        &self.items[self.cursor..]
    }

    /// All expectations, met and unmet.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Expectation> {
        self.items.iter()
    }

    /// Check that every queued expectation was satisfied.
    pub fn expectations_were_met(&self) -> Result<()> {
        if self.pending() == 0 {
            return Ok(());
        }

        Err(HarnessError::ExpectationsNotMet {
            remaining: self.remaining().to_vec(),
        })
    }
}

impl<'a> IntoIterator for &'a ExpectationQueue {
    type Item = &'a Expectation;
    type IntoIter = std::slice::Iter<'a, Expectation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
