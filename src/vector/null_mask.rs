//! Null bitmap of a value vector
//!
//! Bit `i` set means position `i` is NULL. `may_contain_nulls` is a
//! conservative hint: when it is false no bit is set, when it is true some
//! bit may be set.

use crate::common::constants::NUM_BITS_PER_NULL_ENTRY;

/// `NULL_BITMASKS_WITH_SINGLE_ONE[i]` has only bit `i` set
pub const NULL_BITMASKS_WITH_SINGLE_ONE: [u64; 64] = {
    let mut masks = [0u64; 64];
    let mut i = 0;
    while i < 64 {
        masks[i] = 1 << i;
        i += 1;
    }
    masks
};

/// `NULL_LOWER_MASKS[i]` has the lowest `i` bits set
pub const NULL_LOWER_MASKS: [u64; 65] = {
    let mut masks = [0u64; 65];
    let mut i = 1;
    while i < 65 {
        masks[i] = (masks[i - 1] << 1) | 1;
        i += 1;
    }
    masks
};

/// `NULL_HIGH_MASKS[i]` has the highest `i` bits set
pub const NULL_HIGH_MASKS: [u64; 65] = {
    let mut masks = [0u64; 65];
    let mut i = 1;
    while i < 65 {
        masks[i] = (masks[i - 1] >> 1) | (1 << 63);
        i += 1;
    }
    masks
};

const ALL_NULL_ENTRY: u64 = u64::MAX;
const NO_NULL_ENTRY: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullMask {
    data: Vec<u64>,
    may_contain_nulls: bool,
}

impl NullMask {
    /// Mask for `capacity` positions, all non-null
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![NO_NULL_ENTRY; Self::num_null_entries(capacity)],
            may_contain_nulls: false,
        }
    }

    pub fn num_null_entries(num_values: usize) -> usize {
        num_values.div_ceil(NUM_BITS_PER_NULL_ENTRY)
    }

    #[inline]
    fn entry_and_bit(pos: usize) -> (usize, usize) {
        (pos / NUM_BITS_PER_NULL_ENTRY, pos % NUM_BITS_PER_NULL_ENTRY)
    }

    pub fn capacity(&self) -> usize {
        self.data.len() * NUM_BITS_PER_NULL_ENTRY
    }

    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Clear every bit; a no-op when the mask is already known to be clear
    pub fn set_all_non_null(&mut self) {
        if !self.may_contain_nulls {
            return;
        }
        self.data.fill(NO_NULL_ENTRY);
        self.may_contain_nulls = false;
    }

    pub fn set_all_null(&mut self) {
        self.data.fill(ALL_NULL_ENTRY);
        self.may_contain_nulls = true;
    }

    #[inline]
    pub fn has_no_nulls_guarantee(&self) -> bool {
        !self.may_contain_nulls
    }

    pub fn set_may_contain_nulls(&mut self) {
        self.may_contain_nulls = true;
    }

    #[inline]
    pub fn set_null(&mut self, pos: usize, is_null: bool) {
        Self::set_null_in(&mut self.data, pos, is_null);
        if is_null {
            self.may_contain_nulls = true;
        }
    }

    #[inline]
    pub fn is_null(&self, pos: usize) -> bool {
        Self::is_null_in(&self.data, pos)
    }

    #[inline]
    pub fn set_null_in(data: &mut [u64], pos: usize, is_null: bool) {
        let (entry, bit) = Self::entry_and_bit(pos);
        if is_null {
            data[entry] |= NULL_BITMASKS_WITH_SINGLE_ONE[bit];
        } else {
            data[entry] &= !NULL_BITMASKS_WITH_SINGLE_ONE[bit];
        }
    }

    #[inline]
    pub fn is_null_in(data: &[u64], pos: usize) -> bool {
        let (entry, bit) = Self::entry_and_bit(pos);
        data[entry] & NULL_BITMASKS_WITH_SINGLE_ONE[bit] != 0
    }

    /// Set `num_bits` positions starting at `offset`, a word at a time
    pub fn set_null_range(&mut self, offset: usize, num_bits: usize, is_null: bool) {
        if num_bits == 0 {
            return;
        }
        if is_null {
            self.may_contain_nulls = true;
        }
        let (first_entry, first_bit) = Self::entry_and_bit(offset);
        let (last_entry, last_bit) = Self::entry_and_bit(offset + num_bits - 1);
        let apply = |word: &mut u64, mask: u64| {
            if is_null {
                *word |= mask;
            } else {
                *word &= !mask;
            }
        };
        if first_entry == last_entry {
            let mask = NULL_LOWER_MASKS[num_bits] << first_bit;
            apply(&mut self.data[first_entry], mask);
            return;
        }
        apply(&mut self.data[first_entry], NULL_HIGH_MASKS[64 - first_bit]);
        for word in &mut self.data[first_entry + 1..last_entry] {
            *word = if is_null { ALL_NULL_ENTRY } else { NO_NULL_ENTRY };
        }
        apply(&mut self.data[last_entry], NULL_LOWER_MASKS[last_bit + 1]);
    }

    /// Copy `num_bits` bits between arbitrarily aligned offsets of two bitmaps
    ///
    /// Each step moves the largest run that stays inside one source word and
    /// one destination word. Returns whether any copied bit is NULL.
    pub fn copy_null_mask(
        src: &[u64],
        src_offset: usize,
        dst: &mut [u64],
        dst_offset: usize,
        num_bits: usize,
        invert: bool,
    ) -> bool {
        let mut has_null = false;
        let mut copied = 0;
        while copied < num_bits {
            let (src_entry, src_bit) = Self::entry_and_bit(src_offset + copied);
            let (dst_entry, dst_bit) = Self::entry_and_bit(dst_offset + copied);
            let k = (NUM_BITS_PER_NULL_ENTRY - src_bit)
                .min(NUM_BITS_PER_NULL_ENTRY - dst_bit)
                .min(num_bits - copied);
            let mut bits = (src[src_entry] >> src_bit) & NULL_LOWER_MASKS[k];
            if invert {
                bits = !bits & NULL_LOWER_MASKS[k];
            }
            has_null |= bits != 0;
            let window = NULL_LOWER_MASKS[k] << dst_bit;
            dst[dst_entry] = (dst[dst_entry] & !window) | (bits << dst_bit);
            copied += k;
        }
        has_null
    }

    /// Copy bits from another bitmap into this mask
    pub fn copy_from_null_bits(
        &mut self,
        src: &[u64],
        src_offset: usize,
        dst_offset: usize,
        num_bits: usize,
        invert: bool,
    ) -> bool {
        let has_null =
            Self::copy_null_mask(src, src_offset, &mut self.data, dst_offset, num_bits, invert);
        if has_null {
            self.may_contain_nulls = true;
        }
        has_null
    }

    /// Whether the bits in the range are all NULL, all non-NULL or mixed
    ///
    /// Returns `(min, max)` of the bits: `(true, true)` when every position is
    /// NULL, `(false, false)` when none is, `(false, true)` otherwise.
    pub fn get_min_max_in(data: &[u64], offset: usize, num_bits: usize) -> (bool, bool) {
        if num_bits == 0 {
            return (false, false);
        }
        let mut any_null = false;
        let mut any_non_null = false;
        let mut checked = 0;
        while checked < num_bits {
            let (entry, bit) = Self::entry_and_bit(offset + checked);
            let k = (NUM_BITS_PER_NULL_ENTRY - bit).min(num_bits - checked);
            let bits = (data[entry] >> bit) & NULL_LOWER_MASKS[k];
            any_null |= bits != 0;
            any_non_null |= bits != NULL_LOWER_MASKS[k];
            if any_null && any_non_null {
                return (false, true);
            }
            checked += k;
        }
        (any_null, any_null)
    }

    pub fn get_min_max(&self, offset: usize, num_bits: usize) -> (bool, bool) {
        if self.has_no_nulls_guarantee() {
            return (false, false);
        }
        Self::get_min_max_in(&self.data, offset, num_bits)
    }

    /// Grow to at least `capacity` positions; new positions are non-null
    pub fn resize(&mut self, capacity: usize) {
        let num_entries = Self::num_null_entries(capacity);
        if num_entries > self.data.len() {
            self.data.resize(num_entries, NO_NULL_ENTRY);
        }
    }

    pub fn count_nulls(&self) -> usize {
        if self.has_no_nulls_guarantee() {
            return 0;
        }
        self.data.iter().map(|word| word.count_ones() as usize).sum()
    }
}
