#![doc = include_str!("../README.md")]

use crate::tests::frequency_block::FrequencyBlockTestArg;
use crate::tests::linear_complexity::LinearComplexityTestArg;
use crate::tests::serial::SerialTestArg;
use crate::tests::template_matching::non_overlapping::NonOverlappingTemplateTestArgs;
use crate::tests::template_matching::overlapping::OverlappingTemplateTestArgs;
use strum::EnumIter;
use thiserror::Error;
use crate::tests::approximate_entropy::ApproximateEntropyTestArg;

pub use strum::IntoEnumIterator;

// internal usage only
pub(crate) mod internals;
#[cfg(test)]
mod unit_tests;

// public exports
pub mod bitvec;
pub mod driver;
pub mod metrics;
pub mod store;
pub mod test_runner;
pub mod tests;

// shared data structures

/// How many bits a byte has
const BYTE_SIZE: usize = 8;

/// List of all tests, used e.g. for automatic running.
#[repr(C)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, EnumIter)]
pub enum Test {
    Frequency,
    FrequencyWithinABlock,
    Runs,
    LongestRunOfOnes,
    BinaryMatrixRank,
    SpectralDft,
    NonOverlappingTemplateMatching,
    OverlappingTemplateMatching,
    MaurersUniversalStatistical,
    LinearComplexity,
    Serial,
    ApproximateEntropy,
    CumulativeSums,
    RandomExcursions,
    RandomExcursionsVariant,
}

impl std::fmt::Display for Test {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Test::Frequency => "Frequency",
            Test::FrequencyWithinABlock => "FrequencyWithinABlock",
            Test::Runs => "Runs",
            Test::LongestRunOfOnes => "LongestRunOfOnes",
            Test::BinaryMatrixRank => "BinaryMatrixRank",
            Test::SpectralDft => "SpectralDft",
            Test::NonOverlappingTemplateMatching => "NonOverlappingTemplateMatching",
            Test::OverlappingTemplateMatching => "OverlappingTemplateMatching",
            Test::MaurersUniversalStatistical => "MaurersUniversalStatistical",
            Test::LinearComplexity => "LinearComplexity",
            Test::Serial => "Serial",
            Test::ApproximateEntropy => "ApproximateEntropy",
            Test::CumulativeSums => "CumulativeSums",
            Test::RandomExcursions => "RandomExcursions",
            Test::RandomExcursionsVariant => "RandomExcursionsVariant",
        };
        f.write_str(name)
    }
}

impl Test {
    /// The minimum input length, in bits, this test requires to run without declining.
    pub fn min_input_length(&self) -> usize {
        match self {
            Test::Frequency => tests::frequency::MIN_INPUT_LENGTH.get(),
            Test::FrequencyWithinABlock => tests::frequency_block::MIN_INPUT_LENGTH.get(),
            Test::Runs => tests::runs::MIN_INPUT_LENGTH.get(),
            Test::LongestRunOfOnes => tests::longest_run_of_ones::MIN_INPUT_LENGTH,
            Test::BinaryMatrixRank => tests::binary_matrix_rank::MIN_INPUT_LENGTH,
            Test::SpectralDft => tests::spectral_dft::MIN_INPUT_LENGTH.get(),
            Test::NonOverlappingTemplateMatching => {
                tests::template_matching::non_overlapping::MIN_INPUT_LENGTH.get()
            }
            Test::OverlappingTemplateMatching => tests::template_matching::overlapping::MIN_INPUT_LENGTH,
            Test::MaurersUniversalStatistical => {
                tests::maurers_universal_statistical::MIN_INPUT_LENGTH.get()
            }
            Test::LinearComplexity => tests::linear_complexity::MIN_INPUT_LENGTH,
            Test::Serial => tests::serial::MIN_INPUT_LENGTH,
            Test::ApproximateEntropy => tests::approximate_entropy::MIN_INPUT_LENGTH,
            Test::CumulativeSums => tests::cumulative_sums::MIN_INPUT_LENGTH,
            Test::RandomExcursions => tests::random_excursions::MIN_INPUT_LENGTH.get(),
            Test::RandomExcursionsVariant => tests::random_excursions_variant::MIN_INPUT_LENGTH.get(),
        }
    }

    /// The number of [TestResult]s this test produces for a single iteration, given the
    /// arguments it would be run with. For most tests this is fixed; for
    /// [NonOverlappingTemplateMatching](Test::NonOverlappingTemplateMatching) it depends on the
    /// number of templates configured in `args`.
    pub fn partition_count(&self, args: &TestArgs) -> usize {
        match self {
            Test::Serial | Test::CumulativeSums => 2,
            Test::RandomExcursions => 8,
            Test::RandomExcursionsVariant => 18,
            Test::NonOverlappingTemplateMatching => args.non_overlapping_template.template_count(),
            _ => 1,
        }
    }
}

/// The significance level recommended by NIST SP 800-22 for a single iteration's pass/fail
/// judgement.
pub const DEFAULT_THRESHOLD: f64 = 0.01;

/// All test arguments for use in a [TestRunner](test_runner::TestRunner),
/// prefilled with sane defaults.
///
/// You can construct an instance, leaving all other arguments as the default, like this:
/// ```
/// use std::num::NonZeroUsize;
/// use sts_lib::TestArgs;
/// use sts_lib::tests::frequency_block::FrequencyBlockTestArg;
/// let args = TestArgs {
///     frequency_block: FrequencyBlockTestArg::Bitwise(NonZeroUsize::new(23).unwrap()),
///     ..Default::default()
/// };
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct TestArgs {
    pub frequency_block: FrequencyBlockTestArg,
    pub non_overlapping_template: NonOverlappingTemplateTestArgs<'static>,
    pub overlapping_template: OverlappingTemplateTestArgs,
    pub linear_complexity: LinearComplexityTestArg,
    pub serial: SerialTestArg,
    pub approximate_entropy: ApproximateEntropyTestArg,
}

/// The common test result type, as used by most tests.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct TestResult {
    p_value: f64,
    comment: Option<&'static str>,
    declined: bool,
}

// private methods
impl TestResult {
    /// A new test result without comment.
    fn new(p_value: f64) -> Self {
        Self {
            p_value,
            comment: None,
            declined: false,
        }
    }

    /// A new test result with a comment. The comment is metadata (e.g. which partition or
    /// excursion state this result belongs to) and does not by itself mean the test declined.
    fn new_with_comment(p_value: f64, comment: &'static str) -> Self {
        Self {
            p_value,
            comment: Some(comment),
            declined: false,
        }
    }

    /// A result for an iteration where the test's precondition on the input was not met, so no
    /// p-value could be produced. `comment` should explain which precondition failed.
    fn new_declined(comment: &'static str) -> Self {
        Self {
            p_value: 0.0,
            comment: Some(comment),
            declined: true,
        }
    }
}

// public methods
impl TestResult {
    /// The p_value (result of the test)
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// To determine if the test passed, based on the given threshold:
    /// The test passes if the [p_value](Self::p_value) is greater or equal to the given
    /// threshold.
    pub fn passed(&self, threshold: f64) -> bool {
        self.p_value >= threshold
    }

    /// Some tests leave a comment about the outcome.
    pub fn comment(&self) -> Option<&'static str> {
        self.comment
    }

    /// Whether the test declined to produce a p-value for this input, because a precondition on
    /// the input (usually a minimum length or a minimum number of cycles) was not met.
    pub fn declined(&self) -> bool {
        self.declined
    }
}

impl From<[TestResult; 2]> for Vec<TestResult> {
    fn from(results: [TestResult; 2]) -> Self {
        results.to_vec()
    }
}

impl From<[TestResult; 8]> for Vec<TestResult> {
    fn from(results: [TestResult; 8]) -> Self {
        results.to_vec()
    }
}

impl From<[TestResult; 18]> for Vec<TestResult> {
    fn from(results: [TestResult; 18]) -> Self {
        results.to_vec()
    }
}

/// The error type for all tests
#[derive(Error, Debug)]
pub enum Error {
    /// A numeric overflow happened. The String gives further information on where exactly.
    #[error("Overflow in {0}.")]
    Overflow(String),
    #[error("Result is not a number.")]
    NaN,
    #[error("Result is infinite.")]
    Infinite,
    #[error(transparent)]
    GammaFunctionFailed(#[from] statrs::StatsError),
    #[error("Invalid Parameter: {0}")]
    InvalidParameter(String),
}
