//! Bounded sampling buffers for plotting and export.
//!
//! A [`HistoryBuffer`] records a derived-quantity sample only when at least
//! `sample_interval` seconds have passed since the last accepted sample, so
//! the plotting rate is independent of the physics substep. When full, the
//! oldest sample is evicted (FIFO). Samples are never read back into the
//! physics step.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Absorbs floating accumulation in `t - last >= interval`.
const SAMPLE_TIME_SLACK: f64 = 1e-9;

/// A history row with stable, documented field names.
///
/// `FIELDS[0]` is always `"t_s"` and `values()[0]` the sample time, so any
/// export collaborator can emit a header row and records without knowing
/// the demo.
pub trait SampleRecord {
    /// Field names with units, in column order.
    const FIELDS: &'static [&'static str];

    /// Values in the same order as [`Self::FIELDS`].
    fn values(&self) -> Vec<f64>;

    /// Sample time (s).
    fn time(&self) -> f64;
}

/// Fixed-capacity time-sampled ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryBuffer<T> {
    samples: VecDeque<T>,
    capacity: usize,
    sample_interval: f64,
    last_sample_time: Option<f64>,
}

impl<T> HistoryBuffer<T> {
    /// Create an empty buffer.
    ///
    /// A zero capacity is raised to one. A negative or non-finite interval
    /// records every call.
    #[must_use]
    pub fn new(capacity: usize, sample_interval: f64) -> Self {
        let capacity = capacity.max(1);
        let sample_interval = if sample_interval.is_finite() {
            sample_interval.max(0.0)
        } else {
            0.0
        };
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sample_interval,
            last_sample_time: None,
        }
    }

    /// Record `sample` at time `t` if the sampling interval has elapsed.
    ///
    /// Returns whether the sample was stored.
    pub fn record(&mut self, t: f64, sample: T) -> bool {
        if !self.is_due(t) {
            return false;
        }
        self.push(t, sample);
        true
    }

    /// Whether a sample at `t` would be accepted.
    ///
    /// Lets callers skip building a sample that [`record`](Self::record)
    /// would drop.
    #[must_use]
    pub fn is_due(&self, t: f64) -> bool {
        self.last_sample_time
            .map_or(true, |last| t - last + SAMPLE_TIME_SLACK >= self.sample_interval)
    }

    fn push(&mut self, t: f64, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.last_sample_time = Some(t);
    }

    /// Remove all samples and restart the sampling clock.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_sample_time = None;
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Minimum spacing between samples (s).
    #[must_use]
    pub const fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    /// Oldest stored sample.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.samples.front()
    }

    /// Newest stored sample.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Iterate samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.samples.iter()
    }
}

impl<T: Clone> HistoryBuffer<T> {
    /// Copy the samples out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}

impl<T: SampleRecord> HistoryBuffer<T> {
    /// Export as a header plus rows, oldest first.
    #[must_use]
    pub fn export(&self) -> HistoryTable {
        HistoryTable {
            fields: T::FIELDS.to_vec(),
            rows: self.samples.iter().map(SampleRecord::values).collect(),
        }
    }
}

/// Column-oriented export of a history buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryTable {
    /// Field names with units.
    pub fields: Vec<&'static str>,
    /// One row per sample, in field order.
    pub rows: Vec<Vec<f64>>,
}

impl HistoryTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column by field name.
    #[must_use]
    pub fn column(&self, field: &str) -> Option<Vec<f64>> {
        let index = self.fields.iter().position(|f| *f == field)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_bounded_and_monotonic(
            capacity in 1usize..50,
            interval in 0.0f64..0.5,
            steps in 1usize..500,
            dt in 0.001f64..0.1,
        ) {
            let mut h = HistoryBuffer::new(capacity, interval);
            let mut t = 0.0;
            for _ in 0..steps {
                h.record(t, t);
                t += dt;
            }
            prop_assert!(h.len() <= capacity);
            let times: Vec<f64> = h.iter().copied().collect();
            for pair in times.windows(2) {
                prop_assert!(pair[1] > pair[0]);
                prop_assert!(pair[1] - pair[0] + 1e-9 >= interval);
            }
        }
    }
}
