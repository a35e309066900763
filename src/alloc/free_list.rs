// =============================================================================
// segfit — Segregated Free-List Registry
// =============================================================================

use super::{codec, size_class, Allocator, MIN_BLOCK_SIZE, N_FREE_LISTS};
use crate::provider::PageProvider;

impl<P: PageProvider> Allocator<P> {
    /// Rewrites `addr` as a canonical free header+footer and links it at
    /// the head of its size class. Refuses (no-op) if the block's link
    /// words already look non-null — a defensive guard against
    /// double-insertion. Callers that build a block fresh (split,
    /// coalesce, bootstrap) must zero its link words first.
    pub(crate) fn free_list_insert(&mut self, addr: usize) {
        let size = codec::size_of(self.decode_header(addr));
        self.write_header_footer(addr, size, codec::make_free_header(size));

        if self.link_next(addr) != 0 || self.link_prev(addr) != 0 {
            return;
        }

        let index = size_class::free_list_index(size);
        let head_addr = &self.free_lists[index] as *const _ as usize;
        let head_next = self.link_next(head_addr);

        self.set_link_next(addr, head_next);
        self.set_link_prev(addr, head_addr);
        // Unconditional: when the list was empty, `head_next == head_addr`
        // and this writes the sentinel's own `prev` back to `addr`, which is
        // exactly what an empty-list insertion must do.
        self.set_link_prev(head_next, addr);
        self.set_link_next(head_addr, addr);
    }

    /// Unlinks `addr` from whichever free list it sits in and nulls its own
    /// link words. Silently refuses if the links look inconsistent (either
    /// null, or a neighbor's back-pointer disagrees) — callers only ever
    /// invoke this on blocks the registry itself is tracking, so a refusal
    /// here indicates a bug upstream rather than a case to recover from.
    pub(crate) fn free_list_remove(&mut self, addr: usize) {
        let prev = self.link_prev(addr);
        let next = self.link_next(addr);

        if prev == 0 || next == 0 || self.link_next(prev) != addr || self.link_prev(next) != addr {
            return;
        }

        self.set_link_next(prev, next);
        self.set_link_prev(next, prev);
        self.set_link_next(addr, 0);
        self.set_link_prev(addr, 0);
    }

    /// First-fit search starting at `size`'s own list and continuing
    /// through every larger list. Skips anything whose decoded header
    /// looks allocated or undersized — a block reachable from a sentinel
    /// should never look like that, but the search stays defensive per
    /// spec §4.4.
    pub(crate) fn find_fit(&self, size: usize) -> Option<usize> {
        for index in size_class::free_list_index(size)..N_FREE_LISTS {
            let head_addr = &self.free_lists[index] as *const _ as usize;
            let mut curr = self.link_next(head_addr);
            while curr != head_addr {
                let header = self.decode_header(curr);
                let block_size = codec::size_of(header);
                if !codec::is_allocated(header) && block_size >= MIN_BLOCK_SIZE && block_size >= size {
                    return Some(curr);
                }
                curr = self.link_next(curr);
            }
        }
        None
    }

    /// Population across every free list, or just blocks matching `size`
    /// if given. Walks the real sentinel array rather than keeping a
    /// shadow count, so it is exact at call time.
    pub fn free_block_count(&self, size: Option<usize>) -> usize {
        let mut count = 0;
        for index in 0..N_FREE_LISTS {
            let head_addr = &self.free_lists[index] as *const _ as usize;
            let mut curr = self.link_next(head_addr);
            while curr != head_addr {
                let block_size = codec::size_of(self.decode_header(curr));
                if size.is_none_or(|want| want == block_size) {
                    count += 1;
                }
                curr = self.link_next(curr);
            }
        }
        count
    }

    /// P4 (free-list half): every block reachable from a free-list
    /// sentinel has `ALLOCATED` clear, `IN_QUICK_LIST` clear, and size
    /// `>= MIN_BLOCK_SIZE`. Walks the real sentinel array, not a cache.
    pub fn free_list_blocks_are_sound(&self) -> bool {
        for index in 0..N_FREE_LISTS {
            let head_addr = &self.free_lists[index] as *const _ as usize;
            let mut curr = self.link_next(head_addr);
            while curr != head_addr {
                let header = self.decode_header(curr);
                if codec::is_allocated(header)
                    || codec::is_in_quick_list(header)
                    || codec::size_of(header) < MIN_BLOCK_SIZE
                {
                    return false;
                }
                curr = self.link_next(curr);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_util::TestPageProvider;

    fn fresh_allocator() -> Allocator<TestPageProvider> {
        Allocator::new(TestPageProvider::new(64 * 1024, 0xABCD_1234_5678_9999))
    }

    #[test]
    fn insert_then_find_fit_locates_the_block() {
        let mut a = fresh_allocator();
        a.ensure_bootstrapped().unwrap();
        // the bootstrap free block is already inserted; it should be found.
        assert!(a.find_fit(32).is_some());
        assert!(a.find_fit(1_000_000).is_none());
    }

    #[test]
    fn remove_then_find_fit_no_longer_sees_it() {
        let mut a = fresh_allocator();
        a.ensure_bootstrapped().unwrap();
        let block = a.find_fit(32).unwrap();
        a.free_list_remove(block);
        assert!(a.find_fit(32).is_none());
    }
}
