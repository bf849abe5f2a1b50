// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cache-line constants and the address-range carrier used by the flush path.

use static_assertions::{const_assert, const_assert_eq};

/// Base-two exponent of the invalidation granule.
///
/// The platform tracks instruction-cache invalidation in word-sized granules,
/// so ranges handed to the flush path are measured in machine words rather
/// than in hardware line bytes.
pub const LOG2_LINE_SIZE: u32 = 3;

/// Invalidation granule in bytes.
pub const LINE_SIZE: usize = 1 << LOG2_LINE_SIZE;

const_assert!(LINE_SIZE.is_power_of_two());
const_assert_eq!(LINE_SIZE, core::mem::size_of::<usize>());

/// A contiguous span of executable memory, measured in cache-line units.
///
/// `start` is expected to be line aligned; the byte view is the half-open
/// interval `[start, end())`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressRange {
    /// First byte of the span.
    pub start: usize,
    /// Length of the span in cache-line units.
    pub lines: usize,
}

impl AddressRange {
    /// Creates a range from a line-aligned start address and a line count.
    pub const fn new(start: usize, lines: usize) -> Self {
        Self { start, lines }
    }

    /// Builds the smallest line-aligned range covering `[start, start + nbytes)`.
    ///
    /// The start is rounded down and the end rounded up to the invalidation
    /// granule, so callers may hand over raw emission bounds.
    pub const fn from_bytes(start: usize, nbytes: usize) -> Self {
        let aligned_start = start & !(LINE_SIZE - 1);
        let aligned_end = (start + nbytes + LINE_SIZE - 1) & !(LINE_SIZE - 1);
        Self { start: aligned_start, lines: (aligned_end - aligned_start) >> LOG2_LINE_SIZE }
    }

    /// One past the last byte of the span.
    pub const fn end(&self) -> usize {
        self.start + (self.lines << LOG2_LINE_SIZE)
    }

    /// Returns true when the span covers no lines.
    pub const fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Returns true when `start` sits on a line boundary.
    pub const fn is_line_aligned(&self) -> bool {
        self.start & (LINE_SIZE - 1) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressRange, LINE_SIZE, LOG2_LINE_SIZE};

    #[test]
    fn line_constants_golden() {
        // Pinned platform constants; a change here is an ABI change.
        assert_eq!(LOG2_LINE_SIZE, 3);
        assert_eq!(LINE_SIZE, 8);
    }

    #[test]
    fn end_is_start_plus_lines() {
        let range = AddressRange::new(0x1000, 4);
        assert_eq!(range.end(), 0x1000 + 4 * LINE_SIZE);
        assert!(!range.is_empty());
        assert!(range.is_line_aligned());
    }

    #[test]
    fn zero_lines_is_empty() {
        let range = AddressRange::new(0x2000, 0);
        assert!(range.is_empty());
        assert_eq!(range.end(), range.start);
    }

    #[test]
    fn from_bytes_rounds_outward() {
        let range = AddressRange::from_bytes(0x1003, 5);
        assert_eq!(range.start, 0x1000);
        assert_eq!(range.end(), 0x1008);
        assert_eq!(range.lines, 1);
    }
}

#[cfg(test)]
mod tests_prop {
    use super::{AddressRange, LINE_SIZE};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn from_bytes_covers_span(start in 0usize..(1 << 40), nbytes in 0usize..(1 << 20)) {
            let range = AddressRange::from_bytes(start, nbytes);
            prop_assert!(range.start <= start);
            prop_assert!(range.end() >= start + nbytes);
        }

        #[test]
        fn from_bytes_is_aligned(start in 0usize..(1 << 40), nbytes in 0usize..(1 << 20)) {
            let range = AddressRange::from_bytes(start, nbytes);
            prop_assert!(range.is_line_aligned());
            prop_assert_eq!(range.end() % LINE_SIZE, 0);
        }

        #[test]
        fn from_bytes_is_minimal(start in 0usize..(1 << 40), nbytes in 0usize..(1 << 20)) {
            // Rounding may add at most one partial line on each side.
            let range = AddressRange::from_bytes(start, nbytes);
            prop_assert!(range.end() - range.start < nbytes + 2 * LINE_SIZE);
        }
    }
}
