//! Storage for the p-values produced across many iterations of a test.
//!
//! A test that emits more than one p-value per iteration (e.g. CUSUM emits 2, RandomExcursions
//! emits 8) is said to have several *partitions*; each partition gets its own slot in the store.
//! Iteration `i`, partition `p` always lands at the fixed offset `i * partition_count + p`,
//! regardless of which worker thread computed it - this is what lets iterations complete out of
//! order while still producing output in iteration order.

use std::sync::Mutex;

use crate::TestResult;

/// A single stored outcome for one (iteration, partition) slot.
#[derive(Copy, Clone, Debug)]
pub enum Observation {
    /// A valid p-value.
    PValue(f64),
    /// The test declined for this iteration (a precondition, e.g. a minimum cycle count, was not
    /// met). Declined observations are excluded entirely from the sample count used by
    /// [MetricsEngine](crate::metrics::MetricsEngine).
    Declined,
    /// The kernel produced a numeric anomaly (NaN, infinite, or a p-value outside `[0, 1]`).
    /// Counted toward the sample count and toward `tooLow`, but excluded from the uniformity
    /// binning so that the bin counts still sum to a consistent total.
    Failed,
}

impl Observation {
    /// Builds an observation from a test result and the fixed pass/fail threshold.
    pub(crate) fn from_result(result: &TestResult) -> Self {
        if result.declined() {
            return Observation::Declined;
        }

        let p_value = result.p_value();
        if (0.0..=1.0).contains(&p_value) {
            Observation::PValue(p_value)
        } else {
            Observation::Failed
        }
    }
}

/// A fixed-size, sparsely-written store of [Observation]s for a single test, indexed by
/// `iteration * partition_count + partition`.
pub struct PValueStore {
    partition_count: usize,
    slots: Mutex<Vec<Option<Observation>>>,
}

impl PValueStore {
    /// Creates a store pre-sized to hold every iteration of every partition. Slots start out
    /// empty and are filled in as iterations complete.
    pub fn new(iterations: usize, partition_count: usize) -> Self {
        Self {
            partition_count,
            slots: Mutex::new(vec![None; iterations * partition_count]),
        }
    }

    /// The number of p-values a single iteration of this test emits.
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Records the outcome of iteration `iteration`, partition `partition`.
    ///
    /// # Panics
    /// Panics if `partition >= partition_count()` or if the store's mutex is poisoned (a prior
    /// write panicked while holding the lock).
    pub fn set(&self, iteration: usize, partition: usize, observation: Observation) {
        assert!(partition < self.partition_count, "partition out of range");
        let idx = iteration * self.partition_count + partition;
        let mut slots = self.slots.lock().expect("p-value store mutex poisoned");
        slots[idx] = Some(observation);
    }

    /// Returns the recorded observations for a single partition, across all iterations, in
    /// iteration order. Slots that were never written (e.g. a cancelled run) are omitted.
    pub fn partition(&self, partition: usize) -> Vec<Observation> {
        let slots = self.slots.lock().expect("p-value store mutex poisoned");
        slots
            .iter()
            .skip(partition)
            .step_by(self.partition_count)
            .filter_map(|slot| *slot)
            .collect()
    }
}
