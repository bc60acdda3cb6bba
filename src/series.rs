//! A named, time-ordered run of samples with sliding-window eviction.

use crate::types::{Sample, SeriesSnapshot, Timestamp};
use std::collections::VecDeque;

/// Samples for one name within one game, oldest first.
#[derive(Clone, Debug)]
pub(crate) struct Series {
    name: String,
    samples: VecDeque<Sample>,
}

impl Series {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: VecDeque::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Timestamp of the newest sample, if any.
    pub(crate) fn last_timestamp(&self) -> Option<Timestamp> {
        self.samples.back().map(Sample::timestamp)
    }

    /// Drop every sample strictly older than `cutoff`. Returns how many went.
    ///
    /// Samples are sorted, so this only ever pops from the front.
    pub(crate) fn evict_before(&mut self, cutoff: Timestamp) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.samples.front() {
            if front.timestamp() >= cutoff {
                break;
            }
            self.samples.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Append at the end. The caller stamps `sample` no earlier than
    /// `last_timestamp`, so the series stays sorted in call order.
    pub(crate) fn push(&mut self, sample: Sample) {
        debug_assert!(self.last_timestamp().map_or(true, |last| last <= sample.timestamp()));
        self.samples.push_back(sample);
    }

    pub(crate) fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            name: self.name.clone(),
            values: self.samples.iter().copied().collect(),
        }
    }
}
