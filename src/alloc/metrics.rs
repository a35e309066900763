// =============================================================================
// segfit — Metrics
// =============================================================================

use super::{codec, Allocator, WORD_SIZE};
use crate::provider::PageProvider;

impl<P: PageProvider> Allocator<P> {
    /// Fraction of allocated heap bytes actually handed to clients as
    /// payload. Walks every block from the prologue to the epilogue,
    /// summing payload and total size over blocks whose `ALLOCATED` bit is
    /// set (this includes the prologue itself: zero payload, 32 bytes of
    /// size, which nudges the ratio down exactly as it would in a heap
    /// with no client allocations at all).
    pub fn fragmentation(&self) -> f64 {
        if !self.is_bootstrapped() {
            return 0.0;
        }

        let mut total_payload: u64 = 0;
        let mut total_size: u64 = 0;
        let mut cursor = self.heap_start;

        while cursor + WORD_SIZE < self.heap_end {
            let header = self.decode_header(cursor);
            let size = codec::size_of(header);
            if size == 0 || cursor + size > self.heap_end {
                break;
            }
            if codec::is_allocated(header) {
                total_payload += codec::payload_of(header) as u64;
                total_size += size as u64;
            }
            cursor += size;
        }

        if total_size == 0 {
            0.0
        } else {
            total_payload as f64 / total_size as f64
        }
    }

    /// Peak payload ever held divided by the cumulative bytes the page
    /// provider has granted. Unlike `fragmentation`, this never shrinks
    /// back down after a release.
    pub fn utilization(&self) -> f64 {
        if self.total_heap_size == 0 {
            0.0
        } else {
            self.peak_payload as f64 / self.total_heap_size as f64
        }
    }

    /// P2: no two consecutive blocks are both free (outside the quick
    /// lists, which the coalescing discipline never reaches into). Walks
    /// the heap the same way `fragmentation` does, tracking whether the
    /// previous block was free.
    pub fn no_adjacent_free_blocks(&self) -> bool {
        if !self.is_bootstrapped() {
            return true;
        }

        let mut cursor = self.heap_start;
        let mut prev_was_free = false;

        while cursor + WORD_SIZE < self.heap_end {
            let header = self.decode_header(cursor);
            let size = codec::size_of(header);
            if size == 0 || cursor + size > self.heap_end {
                break;
            }
            let is_free = !codec::is_allocated(header);
            if is_free && prev_was_free {
                return false;
            }
            prev_was_free = is_free;
            cursor += size;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_util::TestPageProvider;

    fn fresh_allocator() -> Allocator<TestPageProvider> {
        Allocator::new(TestPageProvider::new(64 * 1024, 0x1111_2222_3333_4444))
    }

    #[test]
    fn metrics_are_zero_before_bootstrap() {
        let a = fresh_allocator();
        assert_eq!(a.fragmentation(), 0.0);
        assert_eq!(a.utilization(), 0.0);
    }

    #[test]
    fn metrics_stay_within_bounds_after_allocations() {
        let mut a = fresh_allocator();
        a.allocate(4).unwrap();
        a.allocate(100).unwrap();
        assert!(a.fragmentation() >= 0.0 && a.fragmentation() <= 1.0);
        assert!(a.utilization() >= 0.0 && a.utilization() <= 1.0);
        assert!(a.utilization() > 0.0);
    }
}
