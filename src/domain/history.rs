use std::collections::VecDeque;

use super::{classify, Measurement, ProbeSample};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded, chronologically ordered measurement history for one endpoint.
///
/// Appends go to the tail; once `capacity` is reached the oldest entry is
/// evicted from the head.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Measurement>,
    capacity: usize,
    status_window: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize, status_window: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            status_window,
        }
    }

    /// Append a sample and attach the status of the window ending at it.
    pub fn record(&mut self, ts: i64, sample: ProbeSample) -> &Measurement {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }

        // The window ends at the new sample, so it takes window - 1 of the
        // entries already kept.
        let skip = self
            .entries
            .len()
            .saturating_sub(self.status_window.saturating_sub(1));
        let status = classify(
            self.entries
                .iter()
                .skip(skip)
                .map(|m| m.loss)
                .chain(std::iter::once(sample.loss_percent)),
            self.status_window,
        );

        self.entries.push_back(Measurement::new(ts, sample, status));
        &self.entries[self.entries.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.entries.iter()
    }

    /// Owned copy in insertion order, detached from the live buffer
    pub fn to_vec(&self) -> Vec<Measurement> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
