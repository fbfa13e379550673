//! Per-run dispatch: for each enabled test, run every iteration, collect p-values, then hand the
//! collected stores off to [metrics analysis](crate::metrics).
//!
//! The state machine mirrors NIST SP 800-22's reference driver: `Null -> Init -> Iterate -> Print
//! -> Metrics -> Destroy`, with `Init` re-entrant from `Destroy` for a subsequent run. A test that
//! does not meet its minimum input length self-disables during `Init` and is skipped by every
//! later phase; if every test disables itself, `init` fails fast.

use std::collections::HashMap;

use log::warn;
use strum::IntoEnumIterator;

use crate::bitvec::BitVec;
use crate::internals::THREAD_POOL;
use crate::metrics::{self, MetricResult};
use crate::store::{Observation, PValueStore};
use crate::test_runner::run_test;
use crate::{Error, Test, TestArgs, TestResult};

/// The driver's current phase. Transitions are forward-only, except that [State::Destroy] can
/// move back to [State::Init] to start a new run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Null,
    Init,
    Iterate,
    Print,
    Metrics,
    Destroy,
}

/// Error raised when `init` finds every test disabled for the given input length, or when a
/// phase is invoked out of order.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no test is enabled for an input of {0} bits - every test's minimum length exceeds it")]
    NoTestEnabled(usize),
    #[error("driver is in phase {from:?}, cannot move to {to:?}")]
    InvalidTransition { from: State, to: State },
}

/// Owns the per-test p-value stores and drives a full run through `init -> iterate -> metrics`.
pub struct Driver {
    state: State,
    iterations: usize,
    bits_per_iteration: usize,
    args: TestArgs,
    enabled: Vec<Test>,
    stores: HashMap<Test, PValueStore>,
}

impl Driver {
    /// `Init`: determines which tests are enabled for an input of `bits_per_iteration` bits,
    /// allocates a [PValueStore] for each, and returns the driver ready for [Self::iterate].
    ///
    /// A test self-disables (and is logged as such) if `bits_per_iteration` is below its minimum
    /// input length. If every test disables itself, returns [DriverError::NoTestEnabled].
    pub fn init(
        bits_per_iteration: usize,
        iterations: usize,
        args: TestArgs,
    ) -> Result<Self, DriverError> {
        let enabled: Vec<Test> = Test::iter()
            .filter(|test| {
                let min_len = test.min_input_length();
                let ok = bits_per_iteration >= min_len;
                if !ok {
                    warn!(
                        "{test} disabled: input length {bits_per_iteration} is below its minimum of {min_len}"
                    );
                }
                ok
            })
            .collect();

        if enabled.is_empty() {
            return Err(DriverError::NoTestEnabled(bits_per_iteration));
        }

        let stores = enabled
            .iter()
            .map(|&test| {
                let store = PValueStore::new(iterations, test.partition_count(&args));
                (test, store)
            })
            .collect();

        Ok(Self {
            state: State::Init,
            iterations,
            bits_per_iteration,
            args,
            enabled,
            stores,
        })
    }

    /// The tests that remain enabled after `init`.
    pub fn enabled_tests(&self) -> &[Test] {
        &self.enabled
    }

    /// `Iterate`: runs every enabled test against every iteration's bit sequence, writing results
    /// into the per-test stores at their fixed `iteration * partition_count + partition` offset.
    ///
    /// `data_source` supplies the bit sequence for a given iteration index; it is called once per
    /// iteration and may run on any worker thread. `on_result`, if given, is invoked after each
    /// iteration's tests complete - this stands in for the reference implementation's `print`
    /// phase, which this crate does not otherwise implement (textual reporting is out of scope).
    ///
    /// Iterations run in parallel; within one iteration, tests run sequentially on the same
    /// worker, matching the concurrency model of one thread per iteration rather than per test.
    pub fn iterate(
        &mut self,
        data_source: impl Fn(usize) -> BitVec + Sync,
        on_result: Option<&(dyn Fn(usize, Test, &[TestResult]) + Sync)>,
    ) -> Result<(), DriverError> {
        if self.state != State::Init {
            return Err(DriverError::InvalidTransition {
                from: self.state,
                to: State::Iterate,
            });
        }

        let iterations = self.iterations;
        let enabled = &self.enabled;
        let args = self.args;
        let stores = &self.stores;

        THREAD_POOL.install(|| {
            use rayon::prelude::*;

            (0..iterations).into_par_iter().for_each(|iteration| {
                let data = data_source(iteration);

                for &test in enabled {
                    let (test, result) = run_test(test, &data, args);
                    let store = &stores[&test];

                    match &result {
                        Ok(results) => {
                            for (partition, result) in results.iter().enumerate() {
                                store.set(iteration, partition, Observation::from_result(result));
                            }

                            if let Some(on_result) = on_result {
                                on_result(iteration, test, results);
                            }
                        }
                        Err(err) => {
                            warn!("iteration {iteration}, test {test}: {err}");
                            for partition in 0..store.partition_count() {
                                store.set(iteration, partition, Observation::Failed);
                            }
                        }
                    }
                }
            });
        });

        self.state = State::Print;
        Ok(())
    }

    /// `Metrics`: aggregates every enabled test's stores into per-(test, partition)
    /// [MetricResult]s. Must run after [Self::iterate].
    pub fn metrics(
        &mut self,
        alpha: f64,
        bins: usize,
        uniformity_level: f64,
    ) -> Result<Vec<(Test, usize, MetricResult)>, Error> {
        if !matches!(self.state, State::Print | State::Metrics) {
            return Err(Error::InvalidParameter(format!(
                "driver is in phase {:?}, cannot run metrics yet",
                self.state
            )));
        }

        let mut results = Vec::new();

        for &test in &self.enabled {
            let store = &self.stores[&test];
            let exclude_zero_p = matches!(test, Test::RandomExcursions | Test::RandomExcursionsVariant);

            for partition in 0..store.partition_count() {
                let observations = store.partition(partition);
                let metric = metrics::evaluate(&observations, exclude_zero_p, alpha, bins, uniformity_level)?;
                results.push((test, partition, metric));
            }
        }

        self.state = State::Metrics;
        Ok(results)
    }

    /// `Destroy`: releases the per-test stores. The driver may be re-[initialized](Self::init)
    /// for a subsequent run with a fresh [Driver] value.
    pub fn destroy(mut self) {
        self.stores.clear();
        self.state = State::Destroy;
    }

    /// The current phase.
    pub fn state(&self) -> State {
        self.state
    }

    /// The bit length every iteration's input is expected to have.
    pub fn bits_per_iteration(&self) -> usize {
        self.bits_per_iteration
    }
}
