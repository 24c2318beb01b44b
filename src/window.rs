use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bounded FIFO of the most recent observed values for one (table, field)
/// key. Appending past capacity evicts the oldest value. Persisted across
/// invocations through the state cache; a capacity change is an explicit
/// migration and rebuilds the window empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl ValueWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            values: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// The newest value together with everything that preceded it, oldest
    /// first. The split is what the detector evaluates: statistics over the
    /// preceding values, z-score of the newest.
    pub fn split_latest(&self) -> Option<(Vec<f64>, f64)> {
        let latest = *self.values.back()?;
        let previous = self.values.iter().take(self.values.len() - 1).copied().collect();
        Some((previous, latest))
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}
