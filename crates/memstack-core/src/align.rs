//! Alignment predicates and natural-alignment helpers.
//!
//! All functions are pure. Passing an alignment that is not a non-zero
//! power of two is a caller error: it trips a `debug_assert!` in debug
//! builds and yields an unspecified (but memory-safe) result otherwise.

/// Largest fundamental alignment handed out by the allocators in this
/// workspace. Matches `max_align_t` on mainstream 64-bit targets.
pub const MAX_ALIGNMENT: usize = 16;

/// Whether `alignment` is usable as an alignment: non-zero power of two.
#[inline]
pub const fn is_valid_alignment(alignment: usize) -> bool {
    alignment.is_power_of_two()
}

/// Whether `ptr` is a multiple of `alignment`.
#[inline]
pub fn is_aligned<T>(ptr: *const T, alignment: usize) -> bool {
    debug_assert!(
        is_valid_alignment(alignment),
        "invalid alignment {alignment}"
    );
    ptr.addr() % alignment == 0
}

/// Natural alignment implied by an object of `size` bytes.
///
/// Returns the largest power of two not exceeding `size`, clamped to
/// [`MAX_ALIGNMENT`]. A zero size maps to an alignment of 1.
#[inline]
pub const fn alignment_for(size: usize) -> usize {
    if size >= MAX_ALIGNMENT {
        MAX_ALIGNMENT
    } else if size == 0 {
        1
    } else {
        1 << size.ilog2()
    }
}

/// Number of padding bytes needed to round `address` up to `alignment`.
#[inline]
pub const fn align_offset(address: usize, alignment: usize) -> usize {
    debug_assert!(is_valid_alignment(alignment));
    let misaligned = address & (alignment - 1);
    if misaligned == 0 {
        0
    } else {
        alignment - misaligned
    }
}

/// Round `value` up to the next multiple of `alignment`.
///
/// Returns `None` if the result would overflow `usize`.
#[inline]
pub const fn round_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(is_valid_alignment(alignment));
    match value.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_alignments() {
        assert!(is_valid_alignment(1));
        assert!(is_valid_alignment(2));
        assert!(is_valid_alignment(4096));
        assert!(!is_valid_alignment(0));
        assert!(!is_valid_alignment(3));
        assert!(!is_valid_alignment(24));
    }

    #[test]
    fn is_aligned_checks_address_modulo() {
        assert!(is_aligned(64usize as *const u8, 16));
        assert!(is_aligned(64usize as *const u8, 64));
        assert!(!is_aligned(65usize as *const u8, 2));
        assert!(is_aligned(65usize as *const u8, 1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid alignment")]
    fn is_aligned_rejects_non_power_of_two() {
        let _ = is_aligned(64usize as *const u8, 3);
    }

    #[test]
    fn alignment_for_small_sizes() {
        assert_eq!(alignment_for(0), 1);
        assert_eq!(alignment_for(1), 1);
        assert_eq!(alignment_for(2), 2);
        assert_eq!(alignment_for(3), 2);
        assert_eq!(alignment_for(4), 4);
        assert_eq!(alignment_for(7), 4);
        assert_eq!(alignment_for(8), 8);
        assert_eq!(alignment_for(15), 8);
    }

    #[test]
    fn alignment_for_clamps_to_max() {
        assert_eq!(alignment_for(MAX_ALIGNMENT), MAX_ALIGNMENT);
        assert_eq!(alignment_for(MAX_ALIGNMENT + 1), MAX_ALIGNMENT);
        assert_eq!(alignment_for(usize::MAX), MAX_ALIGNMENT);
    }

    #[test]
    fn align_offset_and_round_up() {
        assert_eq!(align_offset(0, 8), 0);
        assert_eq!(align_offset(1, 8), 7);
        assert_eq!(align_offset(13, 4), 3);
        assert_eq!(round_up(13, 16), Some(16));
        assert_eq!(round_up(32, 16), Some(32));
        assert_eq!(round_up(usize::MAX, 16), None);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn alignment_for_is_power_of_two(size in 0usize..1_000_000) {
                prop_assert!(is_valid_alignment(alignment_for(size)));
                prop_assert!(alignment_for(size) <= MAX_ALIGNMENT);
            }

            #[test]
            fn alignment_for_is_monotonic(a in 0usize..4096, b in 0usize..4096) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(alignment_for(lo) <= alignment_for(hi));
            }

            #[test]
            fn padding_yields_aligned_address(address in 0usize..1 << 40, shift in 0u32..12) {
                let alignment = 1usize << shift;
                let padded = address + align_offset(address, alignment);
                prop_assert!(padded % alignment == 0);
                prop_assert!(padded - address < alignment);
            }
        }
    }
}
