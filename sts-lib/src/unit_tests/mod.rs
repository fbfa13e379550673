//! All unit tests

use crate::bitvec::BitVec;
use crate::driver::Driver;
use crate::metrics::{self, Decision};
use crate::store::Observation;
use crate::tests::frequency::frequency_test;
use crate::tests::runs::runs_test;
use crate::{IntoEnumIterator, Test, TestArgs};

const ALPHA: f64 = 0.01;

/// Function to compare f64 values - == is not a good option
fn assert_f64_close(got: f64, expected: f64, tolerance: f64) {
    assert!(
        f64::abs(got - expected) < tolerance,
        "expected {expected}, got {got}"
    );
}

#[test]
fn test_bitvec_from_bool() {
    let input_data = [true, false, true, true, false, true, false, true, false, true];

    let bitvec = BitVec::from(input_data.as_slice());

    assert_eq!(bitvec.len_bit(), input_data.len());

    let expected_word = 0b1011010101_usize << (usize::BITS as usize - input_data.len());
    assert_eq!(&*bitvec.words, &[expected_word]);
    assert_eq!(bitvec.bit_count_last_word, input_data.len() as u8);
}

#[test]
fn test_bitvec_from_ascii_string() {
    let input_data = "1011010101";

    let bitvec = BitVec::from_ascii_str(input_data).expect("input is valid ASCII 0/1");

    assert_eq!(bitvec.len_bit(), input_data.len());

    let expected_word = 0b1011010101_usize << (usize::BITS as usize - input_data.len());
    assert_eq!(&*bitvec.words, &[expected_word]);
    assert_eq!(bitvec.bit_count_last_word, input_data.len() as u8);
}

#[test]
fn test_bitvec_from_ascii_string_rejects_invalid_chars() {
    assert!(BitVec::from_ascii_str("1021010101").is_none());
}

#[test]
fn test_bitvec_from_c_str() {
    let input_data = c"1011010101";
    let input_len = 10;

    // SAFETY: input_data is a valid, nul-terminated CStr.
    let bitvec = unsafe { BitVec::from_c_str(input_data.as_ptr()) };

    assert_eq!(bitvec.len_bit(), input_len);

    let expected_word = 0b1011010101_usize << (usize::BITS as usize - input_len);
    assert_eq!(&*bitvec.words, &[expected_word]);
}

#[test]
fn test_bitvec_to_bytes_round_trip() {
    let bitvec = BitVec::from_ascii_str("110100011").expect("input is valid ASCII 0/1");
    let (bytes, last_byte) = bitvec.to_bytes();

    assert_eq!(bytes, vec![0b11010001]);
    assert_eq!(last_byte, Some(0b1_0000000));
}

#[test]
fn test_bitvec_crop() {
    let mut bitvec = BitVec::from_ascii_str("1101000111110000").expect("input is valid ASCII 0/1");
    bitvec.crop(9);

    assert_eq!(bitvec.len_bit(), 9);
    let (bytes, last_byte) = bitvec.to_bytes();
    assert_eq!(bytes, vec![0b11010001]);
    assert_eq!(last_byte, Some(0b1_0000000));
}

/// Seed scenario: Frequency on a balanced sequence. `01` repeated to length 100 should have a
/// sum of exactly 0, giving `p = erfc(0) = 1.0`.
#[test]
fn frequency_balanced_sequence() {
    let input: String = "01".repeat(50);
    assert_eq!(input.len(), 100);
    let data = BitVec::from_ascii_str(&input).expect("input is valid ASCII 0/1");

    let result = frequency_test(&data).expect("frequency test should succeed on 100 bits");
    assert_f64_close(result.p_value(), 1.0, 1e-9);
    assert!(result.passed(ALPHA));
}

/// Seed scenario: Frequency on all zeros. With n=100, `s_obs = 10`, giving a vanishingly small
/// p-value.
#[test]
fn frequency_all_zeros() {
    let input = "0".repeat(100);
    let data = BitVec::from_ascii_str(&input).expect("input is valid ASCII 0/1");

    let result = frequency_test(&data).expect("frequency test should succeed on 100 bits");
    assert!(result.p_value() < 1e-20);
    assert!(!result.passed(ALPHA));
}

/// Seed scenario: Runs precondition failure. 95 ones out of 100 bits puts `|pi - 0.5|` well
/// above the `2/sqrt(n)` bound, so the test should decline rather than produce a p-value.
#[test]
fn runs_declines_on_unbalanced_input() {
    let input = format!("{}{}", "1".repeat(95), "0".repeat(5));
    let data = BitVec::from_ascii_str(&input).expect("input is valid ASCII 0/1");

    let result = runs_test(&data).expect("runs test should not error, only decline");
    assert!(result.declined());
}

/// Seed scenario: metrics pass on synthetic uniform p-values. A perfectly even spread of 1000
/// p-values across (0, 1) should comfortably pass both the proportion and uniformity checks.
#[test]
fn metrics_pass_on_synthetic_uniform_p_values() {
    let observations: Vec<Observation> = (0..1000)
        .map(|i| Observation::PValue((i as f64 + 0.5) / 1000.0))
        .collect();

    let result = metrics::evaluate(&observations, false, ALPHA, 10, 1e-4)
        .expect("evaluating a clean set of p-values should not error");

    assert_eq!(result.sample(), 1000);
    assert_eq!(result.bins().iter().sum::<usize>(), 1000);
    assert_eq!(result.decision(), Decision::PassedBoth);
}

#[test]
fn metrics_excludes_declined_and_failed_observations() {
    let observations = vec![
        Observation::PValue(0.5),
        Observation::Declined,
        Observation::Failed,
        Observation::PValue(0.6),
    ];

    let result = metrics::evaluate(&observations, false, ALPHA, 2, 1e-4).unwrap();
    // Declined is excluded entirely; Failed counts toward the sample but not the bins.
    assert_eq!(result.sample(), 3);
    assert_eq!(result.bins().iter().sum::<usize>(), 2);
}

/// End-to-end: init a driver over a periodic `01` stream long enough for every test, run one
/// iteration, and aggregate the results. This exercises the full
/// `init -> iterate -> metrics -> destroy` pipeline.
#[test]
fn driver_runs_full_pipeline_on_periodic_input() {
    let bits_per_iteration = 1_000_000;
    let pattern = "01".repeat(bits_per_iteration / 2);
    let data = BitVec::from_ascii_str(&pattern).expect("input is valid ASCII 0/1");

    let mut driver = Driver::init(bits_per_iteration, 1, TestArgs::default())
        .expect("every test should be enabled for a million-bit input");
    assert_eq!(driver.enabled_tests().len(), Test::iter().count());

    driver
        .iterate(|_iteration| data.clone(), None)
        .expect("iterate should succeed after init");

    let metrics = driver
        .metrics(ALPHA, 10, 1e-4)
        .expect("metrics should succeed after iterate");

    assert!(metrics.iter().any(|(test, _, _)| *test == Test::Frequency));
    assert!(metrics
        .iter()
        .any(|(test, _, _)| *test == Test::CumulativeSums));

    driver.destroy();
}
