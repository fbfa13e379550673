//! Aggregation of the p-values collected for a single (test, partition) across many iterations.
//!
//! Two complementary checks are applied to a batch of p-values: a *proportion* check (how many
//! individually pass at significance level α) and a *uniformity* check (a χ² test over binned
//! p-values, itself reduced to a p-value via `igamc`).

use crate::internals::{check_f64, igamc};
use crate::store::Observation;
use crate::Error;

/// The outcome of a (test, partition) aggregate analysis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Both the uniformity and proportion checks passed.
    PassedBoth,
    /// The uniformity check failed, the proportion check passed.
    FailedUniformity,
    /// The proportion check failed, the uniformity check passed.
    FailedProportion,
    /// Both checks failed.
    FailedBoth,
    /// The uniformity check could not be computed (no valid p-values to bin).
    Undefined,
}

/// The aggregate result for one (test, partition).
#[derive(Clone, Debug)]
pub struct MetricResult {
    sample: usize,
    pass_count: usize,
    pass_min: f64,
    pass_max: f64,
    uniformity_p: Option<f64>,
    bins: Box<[usize]>,
    decision: Decision,
}

impl MetricResult {
    /// The number of counted observations (declined iterations excluded, and, for the
    /// random-excursion tests, p == 0 excluded too).
    pub fn sample(&self) -> usize {
        self.sample
    }

    /// How many of the counted observations passed at the configured α.
    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    /// The lower bound of the acceptable pass-count range.
    pub fn pass_min(&self) -> f64 {
        self.pass_min
    }

    /// The upper bound of the acceptable pass-count range.
    pub fn pass_max(&self) -> f64 {
        self.pass_max
    }

    /// The p-value of the χ² uniformity test, or `None` if it could not be computed (no p-values
    /// were available to bin).
    pub fn uniformity_p(&self) -> Option<f64> {
        self.uniformity_p
    }

    /// The per-bin counts of valid p-values.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// The overall pass/fail decision.
    pub fn decision(&self) -> Decision {
        self.decision
    }
}

/// Evaluates one (test, partition)'s observations into a [MetricResult].
///
/// `exclude_zero_p` implements the random-excursion convention (step 8 of the aggregation
/// procedure): a p-value of exactly 0 signals an unusable cycle and is excluded from the sample
/// count entirely, the same as a decline.
pub fn evaluate(
    observations: &[Observation],
    exclude_zero_p: bool,
    alpha: f64,
    bins: usize,
    uniformity_level: f64,
) -> Result<MetricResult, Error> {
    enum Counted {
        Valid(f64),
        Failed,
    }

    let counted: Vec<Counted> = observations
        .iter()
        .filter_map(|obs| match obs {
            Observation::Declined => None,
            Observation::Failed => Some(Counted::Failed),
            Observation::PValue(p) if exclude_zero_p && *p == 0.0 => None,
            Observation::PValue(p) => Some(Counted::Valid(*p)),
        })
        .collect();

    let sample = counted.len();

    if sample == 0 {
        return Ok(MetricResult {
            sample: 0,
            pass_count: 0,
            pass_min: 0.0,
            pass_max: 0.0,
            uniformity_p: None,
            bins: vec![0; bins].into_boxed_slice(),
            decision: Decision::Undefined,
        });
    }

    let too_low = counted
        .iter()
        .filter(|c| matches!(c, Counted::Failed) || matches!(c, Counted::Valid(p) if *p < alpha))
        .count();
    let pass_count = sample - too_low;

    let p_hat = 1.0 - alpha;
    let sample_f = sample as f64;
    let bound = 3.0 * f64::sqrt(p_hat * alpha / sample_f) * sample_f;
    let pass_min = p_hat * sample_f - bound;
    let pass_max = p_hat * sample_f + bound;

    let mut bin_counts = vec![0_usize; bins];
    let mut binned_count = 0_usize;
    for c in &counted {
        if let Counted::Valid(p) = c {
            let idx = usize::min((p * bins as f64) as usize, bins - 1);
            bin_counts[idx] += 1;
            binned_count += 1;
        }
    }

    let expected = binned_count as f64 / bins as f64;

    let uniformity_p = if expected > 0.0 {
        let chi = bin_counts
            .iter()
            .map(|&count| f64::powi(count as f64 - expected, 2) / expected)
            .sum::<f64>();
        check_f64(chi)?;

        let p = igamc((bins - 1) as f64 / 2.0, chi / 2.0)?;
        check_f64(p)?;
        Some(p)
    } else {
        None
    };

    let proportion_pass = pass_min <= pass_count as f64 && pass_count as f64 <= pass_max;

    let decision = match uniformity_p {
        None => Decision::Undefined,
        Some(p) if p >= uniformity_level && proportion_pass => Decision::PassedBoth,
        Some(p) if p >= uniformity_level => Decision::FailedProportion,
        Some(_) if proportion_pass => Decision::FailedUniformity,
        Some(_) => Decision::FailedBoth,
    };

    Ok(MetricResult {
        sample,
        pass_count,
        pass_min,
        pass_max,
        uniformity_p,
        bins: bin_counts.into_boxed_slice(),
        decision,
    })
}
