// =============================================================================
// segfit — Coalescer
// =============================================================================
//
// Merges a free block with whatever free neighbors border it, using the
// boundary-tag discipline: the footer immediately before a block always
// describes the block that owns it, so "is my predecessor free" is a
// single read away regardless of the predecessor's size. Quick-listed
// neighbors keep `ALLOCATED` set, so they read as allocated here and are
// correctly left untouched.
// =============================================================================

use super::{codec, Allocator, WORD_SIZE};
use crate::provider::PageProvider;

impl<P: PageProvider> Allocator<P> {
    /// `addr` must already hold a canonical free header+footer (the
    /// caller has not yet linked it into any free list). Absorbs any free
    /// neighbors, removing them from their current free list first, then
    /// inserts the single resulting block. Returns the resulting block's
    /// address, which may be `addr` itself, its predecessor, or — if both
    /// neighbors were free — still the predecessor.
    pub(crate) fn coalesce(&mut self, addr: usize) -> usize {
        let mut base = addr;
        let mut size = codec::size_of(self.decode_header(addr));

        let mut prev_addr = 0;
        let mut prev_size = 0;
        let mut prev_free = false;
        if addr >= self.raw_start + WORD_SIZE {
            let prev_footer = codec::decode(unsafe { Self::read_word(addr - WORD_SIZE) }, self.magic);
            prev_size = codec::size_of(prev_footer);
            prev_addr = addr - prev_size;
            prev_free = !codec::is_allocated(prev_footer);
        }

        let next_addr = addr + size;
        let mut next_size = 0;
        let mut next_free = false;
        if next_addr < self.heap_end {
            let next_header = self.decode_header(next_addr);
            next_size = codec::size_of(next_header);
            next_free = !codec::is_allocated(next_header);
        }

        if prev_free {
            self.free_list_remove(prev_addr);
            base = prev_addr;
            size += prev_size;
        }
        if next_free {
            self.free_list_remove(next_addr);
            size += next_size;
        }

        self.set_link_next(base, 0);
        self.set_link_prev(base, 0);
        self.write_header_footer(base, size, codec::make_free_header(size));
        self.free_list_insert(base);
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_util::TestPageProvider;

    fn fresh_allocator() -> Allocator<TestPageProvider> {
        Allocator::new(TestPageProvider::new(64 * 1024, 0x2468_1357_9BDF_0ACE))
    }

    #[test]
    fn releasing_two_neighbors_merges_them_with_the_gap() {
        let mut a = fresh_allocator();
        a.ensure_bootstrapped().unwrap();
        let x = a.allocate(200).unwrap();
        let y = a.allocate(300).unwrap();
        a.allocate(4).unwrap();
        a.release(Some(y));
        a.release(Some(x));
        // x, y and the gap between them (now freed) should have merged
        // into a single free block; no quick-list entries (sizes too
        // large to be quick-listable).
        assert_eq!(a.quick_block_count(None), 0);
    }
}
