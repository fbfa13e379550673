//! Everything needed to store the data to test.

use crate::internals::get_bit_from_value;
use crate::BYTE_SIZE;
use rayon::prelude::*;
use std::ffi::c_char;

const WORD_BITS: usize = usize::BITS as usize;

/// A list of bits, tightly packed into machine words - used in all tests.
///
/// Bits are stored MSB-first within each word: bit 0 of the sequence is the highest bit of
/// `words[0]`. If the bit length is not a multiple of [usize::BITS], the last word in `words`
/// is only partially filled; [Self::bit_count_last_word] gives the number of valid (high) bits
/// in that word, with the remaining low bits set to zero. A `bit_count_last_word` of 0 means
/// every word in `words` is fully valid.
#[derive(Clone)]
pub struct BitVec {
    pub(crate) words: Box<[usize]>,
    pub(crate) bit_count_last_word: u8,
}

impl BitVec {
    /// How many bits the Vec contains.
    pub fn len_bit(&self) -> usize {
        if self.bit_count_last_word == 0 {
            self.words.len() * WORD_BITS
        } else {
            (self.words.len() - 1) * WORD_BITS + self.bit_count_last_word as usize
        }
    }

    /// Splits the backing storage into the fully-valid leading words and, if present, the
    /// partially-filled last word (left-aligned, i.e. the valid bits are the high bits).
    pub(crate) fn as_full_slice(&self) -> (&[usize], Option<usize>) {
        if self.bit_count_last_word == 0 {
            (&self.words, None)
        } else {
            let (full, last) = self.words.split_at(self.words.len() - 1);
            (full, Some(last[0]))
        }
    }

    /// Iterates over every valid bit in order, MSB-first.
    fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        let (full_words, last_word) = self.as_full_slice();

        let full_bits = full_words
            .iter()
            .flat_map(|&word| (0..WORD_BITS).map(move |idx| get_bit_from_value(word, idx)));

        let last_bits = last_word.into_iter().flat_map(move |word| {
            (0..self.bit_count_last_word as usize).map(move |idx| get_bit_from_value(word, idx))
        });

        full_bits.chain(last_bits)
    }

    /// Repacks the bit sequence into bytes, MSB-first. Returns the complete bytes, plus an
    /// optional trailing byte (left-aligned, zero-padded) if the bit length is not a multiple
    /// of 8.
    pub fn to_bytes(&self) -> (Vec<u8>, Option<u8>) {
        let total_bits = self.len_bit();
        let full_byte_count = total_bits / BYTE_SIZE;
        let mut bits = self.bits();

        let bytes = (0..full_byte_count)
            .map(|_| {
                (0..BYTE_SIZE).fold(0u8, |byte, _| (byte << 1) | (bits.next().unwrap() as u8))
            })
            .collect();

        let remaining = total_bits % BYTE_SIZE;
        let last_byte = (remaining > 0).then(|| {
            let byte =
                (0..remaining).fold(0u8, |byte, _| (byte << 1) | (bits.next().unwrap() as u8));
            byte << (BYTE_SIZE - remaining)
        });

        (bytes, last_byte)
    }

    /// Crop the BitVec to the passed bit length. This operation does nothing
    /// if the previous length is greater than the new length.
    pub fn crop(&mut self, new_bit_len: usize) {
        if new_bit_len >= self.len_bit() {
            return;
        }

        let new_word_count = new_bit_len.div_ceil(WORD_BITS);
        let valid_bits_last_word = new_bit_len % WORD_BITS;

        let mut words = std::mem::take(&mut self.words).into_vec();
        words.truncate(new_word_count);

        if valid_bits_last_word != 0 {
            let mask = usize::MAX << (WORD_BITS - valid_bits_last_word);
            if let Some(last) = words.last_mut() {
                *last &= mask;
            }
        }

        self.words = words.into_boxed_slice();
        self.bit_count_last_word = valid_bits_last_word as u8;
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// No other character is allowed. [usize::MAX] bits can be read.
    ///
    /// This function runs in parallel.
    pub fn from_ascii_str(value: &str) -> Option<Self> {
        // split into word-sized chunks and convert
        let chunks = value.as_bytes().par_chunks_exact(WORD_BITS);
        let remainder = chunks.remainder();

        let mut words = chunks
            .map(|chunk| {
                // [0] = MSB
                (0..WORD_BITS).try_fold(0usize, |word, i| match chunk[i] {
                    b'1' => Some((word << 1) | 1),
                    b'0' => Some(word << 1),
                    _ => None,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let bit_count_last_word = if remainder.is_empty() {
            0
        } else {
            let mut last = remainder.iter().try_fold(0usize, |word, &c| match c {
                b'1' => Some((word << 1) | 1),
                b'0' => Some(word << 1),
                _ => None,
            })?;
            last <<= WORD_BITS - remainder.len();
            words.push(last);
            remainder.len() as u8
        };

        Some(Self {
            words: words.into_boxed_slice(),
            bit_count_last_word,
        })
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// Any other character is ignored. [usize::MAX] bits can be read.
    ///
    /// This function runs sequential. (In contrast to [Self::from_ascii_str]).
    pub fn from_ascii_str_lossy(value: &str) -> Self {
        Self::from_ascii_str_lossy_internal(value, None)
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// Any other character is ignored. [usize::MAX] bits can be stored.
    /// A maximum of `max_length` valid bits are read (not counting any invalid characters).
    ///
    /// This function runs sequential. (In contrast to [Self::from_ascii_str]).
    pub fn from_ascii_str_lossy_with_max_length(value: &str, max_length: usize) -> Self {
        Self::from_ascii_str_lossy_internal(value, Some(max_length))
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// Any other character is ignored. [usize::MAX] bits can be stored.
    /// If a max length is given, a maximum of `max_length` valid bits are read
    /// (not counting any invalid characters).
    ///
    /// This function runs sequential. (In contrast to [Self::from_ascii_str]).
    fn from_ascii_str_lossy_internal(value: &str, max_length: Option<usize>) -> Self {
        let bits = value
            .bytes()
            .filter(|&b| b == b'0' || b == b'1')
            .map(|b| b == b'1');

        let bits: Box<dyn Iterator<Item = bool>> = match max_length {
            Some(max_length) => Box::new(bits.take(max_length)),
            None => Box::new(bits),
        };

        Self::from_bit_iter(bits)
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// Any other character is ignored.
    ///
    /// ## Safety
    /// Similar restrictions apply as for [CStr::from_ptr](std::ffi::CStr::from_ptr):
    /// * The memory pointed to by `ptr` must contain a valid nul terminator at the end of the string.
    /// * `ptr` must be valid, as defined by the module safety documentation of `std::ptr`, for reads
    ///   of bytes up to and including the nul terminator.
    ///     * The entire memory range must be contained within a single allocated object!
    /// * `ptr` must have at least length 1: the nul terminator.
    /// * The memory referenced by `ptr` must not be mutated for the duration of this method call.
    /// * `ptr`, particularly the de-allocation of it, remains in the responsibility of the caller.
    ///
    /// Note that the nul terminator **DOES NOT** need to be within [isize::MAX] from `ptr`, but
    /// instead within [usize::MAX] * 8 + 7.
    /// Every valid [CStr](std::ffi::CStr) is a valid pointer for this method.
    pub unsafe fn from_c_str(ptr: *const c_char) -> Self {
        // SAFETY: for the call of the function, the same safety considerations apply
        // as for the call of this function.
        unsafe { Self::from_c_str_internal(ptr, None) }
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// Any other character is ignored.  A maximum of `max_length` valid bits are read
    /// (not counting any invalid characters). This also means that the maximum valid bit length here
    /// is [usize::MAX].
    ///
    /// ## Safety
    /// Similar restrictions apply as for [CStr::from_ptr](std::ffi::CStr::from_ptr):
    /// * The memory pointed to by `ptr` must contain a valid nul terminator at the end of the string.
    /// * `ptr` must be valid, as defined by the module safety documentation of `std::ptr`, for reads
    ///   of bytes up to and including the nul terminator.
    ///     * The entire memory range must be contained within a single allocated object!
    /// * `ptr` must have at least length 1: the nul terminator.
    /// * The memory referenced by `ptr` must not be mutated for the duration of this method call.
    /// * `ptr`, particularly the de-allocation of it, remains in the responsibility of the caller.
    ///
    /// Note that the nul terminator **DOES NOT** need to be within [isize::MAX] from `ptr`, but
    /// instead within [usize::MAX] * 8 + 7.
    /// Every valid [CStr](std::ffi::CStr) is a valid pointer for this method.
    pub unsafe fn from_c_str_with_max_length(ptr: *const c_char, max_length: usize) -> Self {
        // SAFETY: for the call of the function, the same safety considerations apply
        // as for the call of this function.
        unsafe { Self::from_c_str_internal(ptr, Some(max_length)) }
    }

    /// Creates a [BitVec] from a string, with the ASCII char "0" mapping to 0 and "1" mapping to 1.
    /// Any other character is ignored.  If a `max_length` is given, a maximum of `max_length` valid
    /// bits are read (not counting any invalid characters) and the maximum bit length ist
    /// [usize::MAX].
    ///
    /// ## Safety
    /// Similar restrictions apply as for [CStr::from_ptr](std::ffi::CStr::from_ptr):
    /// * The memory pointed to by `ptr` must contain a valid nul terminator at the end of the string.
    /// * `ptr` must be valid, as defined by the module safety documentation of `std::ptr`, for reads
    ///   of bytes up to and including the nul terminator.
    ///     * The entire memory range must be contained within a single allocated object!
    /// * `ptr` must have at least length 1: the nul terminator.
    /// * The memory referenced by `ptr` must not be mutated for the duration of this method call.
    /// * `ptr`, particularly the de-allocation of it, remains in the responsibility of the caller.
    ///
    /// Note that the nul terminator **DOES NOT** need to be within [isize::MAX] from `ptr`, but
    /// instead within [usize::MAX] * 8 + 7.
    /// Every valid [CStr](std::ffi::CStr) is a valid pointer for this method.
    unsafe fn from_c_str_internal(ptr: *const c_char, max_length: Option<usize>) -> Self {
        const CHAR_0: c_char = b'0' as c_char;
        const CHAR_1: c_char = b'1' as c_char;

        let mut bits = Vec::new();
        let mut ptr = ptr;

        // SAFETY: caller has provided a pointer to a valid C String.
        let mut current_value = unsafe { *ptr };
        while current_value != 0 {
            if current_value == CHAR_1 || current_value == CHAR_0 {
                bits.push(current_value == CHAR_1);

                if max_length.is_some_and(|max_length| bits.len() == max_length) {
                    break;
                }
            }

            // SAFETY: caller has provided a pointer to a valid C String, and the end
            // has not yet been reached (otherwise current_value would be 0)
            unsafe {
                ptr = ptr.add(1);
                current_value = *ptr;
            };
        }

        Self::from_bit_iter(bits.into_iter())
    }

    /// Packs a sequence of bits, MSB-first, into words.
    fn from_bit_iter(bits: impl Iterator<Item = bool>) -> Self {
        let mut words = Vec::new();
        let mut current_word: usize = 0;
        let mut count_in_word: usize = 0;

        for bit in bits {
            current_word = (current_word << 1) | (bit as usize);
            count_in_word += 1;

            if count_in_word == WORD_BITS {
                words.push(current_word);
                current_word = 0;
                count_in_word = 0;
            }
        }

        let bit_count_last_word = if count_in_word == 0 {
            0
        } else {
            current_word <<= WORD_BITS - count_in_word;
            words.push(current_word);
            count_in_word as u8
        };

        Self {
            words: words.into_boxed_slice(),
            bit_count_last_word,
        }
    }
}

impl From<Vec<u8>> for BitVec {
    /// Creates a [BitVec] from a [Vec] of bytes, each containing 8 values.
    fn from(value: Vec<u8>) -> Self {
        Self::from(value.as_slice())
    }
}

impl<'a> From<&'a [u8]> for BitVec {
    /// Creates a [BitVec] from a slice of bytes, each containing 8 values.
    fn from(value: &'a [u8]) -> Self {
        let bits = value
            .iter()
            .flat_map(|&byte| (0..BYTE_SIZE).map(move |i| (byte >> (BYTE_SIZE - i - 1)) & 1 == 1));
        Self::from_bit_iter(bits)
    }
}

impl From<Box<[u8]>> for BitVec {
    /// Creates a [BitVec] from a boxed slice of bytes, each containing 8 values.
    fn from(value: Box<[u8]>) -> Self {
        Self::from(value.as_ref())
    }
}

impl From<Vec<bool>> for BitVec {
    /// Creates a [BitVec] from a [Vec] of booleans, each boolean representing one bit.
    fn from(value: Vec<bool>) -> Self {
        Self::from(value.as_slice())
    }
}

impl<'a> From<&'a [bool]> for BitVec {
    /// Creates a [BitVec] from a slice of booleans, each boolean representing one bit.
    fn from(value: &'a [bool]) -> Self {
        Self::from_bit_iter(value.iter().copied())
    }
}
