//! Internal functions that are used by tests - can be changed anytime

use libcerf::erfcx;
use std::sync::LazyLock;

use crate::Error;

/// The [complementary error function](https://en.wikipedia.org/wiki/Error_function)
pub(crate) fn erfc(value: f64) -> f64 {
    // from https://en.wikipedia.org/wiki/Error_function#Complementary_error_function

    // if arithmetic underflow is observed, switching to pure erfcx would likely help

    let exponent = -(value * value);
    f64::exp(exponent) * erfcx(value)
}

/// igamc, the upper regularized incomplete gamma function.
pub(crate) use statrs::function::gamma::checked_gamma_ur as igamc;

/// Checks the f64 value for NaN and Infinite, returns an error if this is the case.
/// This function should be used as a guard.
pub(crate) fn check_f64(value: f64) -> Result<(), Error> {
    if value.is_nan() {
        Err(Error::NaN)
    } else if value.is_infinite() {
        Err(Error::Infinite)
    } else {
        Ok(())
    }
}

/// The thread pool used by all tests and [BitVec](crate::bitvec::BitVec) construction, instead of
/// rayon's global pool. Sized from the number of logical CPUs.
pub(crate) static THREAD_POOL: LazyLock<rayon::ThreadPool> = LazyLock::new(|| {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build()
        .expect("building the default thread pool should never fail")
});

/// Extracts a single bit from a value, MSB first (bit index 0 is the highest bit).
#[inline]
pub(crate) fn get_bit_from_value(value: usize, bit_idx: usize) -> bool {
    (value >> (usize::BITS as usize - bit_idx - 1)) & 1 == 1
}

/// Per-bit access on fixed-width unsigned integers, MSB first.
pub(crate) trait BitPrimitive {
    /// Returns the bit at `idx`, where `idx == 0` is the most significant bit.
    fn get_bit(&self, idx: u32) -> bool;
}

impl BitPrimitive for usize {
    #[inline]
    fn get_bit(&self, idx: u32) -> bool {
        (self >> (usize::BITS - idx - 1)) & 1 == 1
    }
}

/// Checked addition of two signed values, returning [Error::Overflow] on overflow.
macro_rules! checked_add {
    ($a:expr, $b:expr) => {
        $a.checked_add($b)
            .ok_or_else(|| crate::Error::Overflow(format!("adding {} and {}", $a, $b)))
    };
}

/// Checked addition of a signed value with an unsigned count, returning [Error::Overflow] on
/// overflow or on a count that doesn't fit into the signed type.
macro_rules! checked_add_unsigned {
    ($a:expr, $b:expr) => {
        isize::try_from($b)
            .map_err(|_| crate::Error::Overflow(format!("converting {} to isize", $b)))
            .and_then(|b| {
                $a.checked_add(b)
                    .ok_or_else(|| crate::Error::Overflow(format!("adding {} and {}", $a, b)))
            })
    };
}

/// Checked subtraction of an unsigned count from a signed value, returning [Error::Overflow] on
/// overflow or on a count that doesn't fit into the signed type.
macro_rules! checked_sub_unsigned {
    ($a:expr, $b:expr) => {
        isize::try_from($b)
            .map_err(|_| crate::Error::Overflow(format!("converting {} to isize", $b)))
            .and_then(|b| {
                $a.checked_sub(b)
                    .ok_or_else(|| crate::Error::Overflow(format!("subtracting {} from {}", b, $a)))
            })
    };
}

pub(crate) use checked_add;
pub(crate) use checked_add_unsigned;
pub(crate) use checked_sub_unsigned;
