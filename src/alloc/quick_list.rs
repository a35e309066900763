// =============================================================================
// segfit — Quick-List Registry
// =============================================================================
//
// Small recently-freed blocks are parked here instead of going straight
// through the coalescer, trading a little fragmentation for avoiding
// coalesce/split churn on the sizes that see the most allocate/release
// traffic. Quick-listed blocks keep `ALLOCATED` set, so the coalescer
// treats them as live and never merges across one.
// =============================================================================

use super::{codec, size_class, Allocator, QUICK_LIST_MAX};
use crate::provider::PageProvider;

impl<P: PageProvider> Allocator<P> {
    /// Pushes `addr` (already sized and currently a canonical free block,
    /// as produced by `release`) onto its quick list, flushing first if
    /// that list is already at [`QUICK_LIST_MAX`]. Returns `false` without
    /// touching `addr` if its size isn't quick-listable at all.
    pub(crate) fn quick_list_push(&mut self, addr: usize, size: usize) -> bool {
        let Some(index) = size_class::quick_list_index(size) else {
            return false;
        };

        if self.quick_lists[index].len >= QUICK_LIST_MAX {
            self.quick_list_flush(index);
        }

        self.write_header_footer(addr, size, codec::make_quicklist_header(size));
        self.set_quick_link_next(addr, self.quick_lists[index].head);
        self.quick_lists[index].head = addr;
        self.quick_lists[index].len += 1;
        true
    }

    /// Pops the most-recently-pushed block off quick list `index` for
    /// reuse, stripping `IN_QUICK_LIST` but leaving `ALLOCATED` set and the
    /// size untouched. The caller re-stamps the payload field with the new
    /// request size. Aborts the process if the popped block doesn't carry
    /// both expected flags — that can only mean the heap was corrupted out
    /// from under the registry (spec invariant I4).
    pub(crate) fn quick_list_pop(&mut self, index: usize) -> Option<usize> {
        let addr = self.quick_lists[index].head;
        if addr == 0 {
            return None;
        }

        let header = self.decode_header(addr);
        if !codec::is_allocated(header) || !codec::is_in_quick_list(header) {
            crate::error::corrupted("quick-list block missing ALLOCATED|IN_QUICK_LIST flags");
        }

        self.quick_lists[index].head = self.quick_link_next(addr);
        self.quick_lists[index].len -= 1;

        let size = codec::size_of(header);
        self.write_header_only(addr, codec::make_allocated_header(size, 0));
        Some(addr)
    }

    /// Moves every block in quick list `index` back into the free-list
    /// registry, coalescing each with its neighbors as it goes, then
    /// empties the list.
    pub(crate) fn quick_list_flush(&mut self, index: usize) {
        let mut curr = self.quick_lists[index].head;
        while curr != 0 {
            let next = self.quick_link_next(curr);
            let size = codec::size_of(self.decode_header(curr));
            self.write_header_footer(curr, size, codec::make_free_header(size));
            self.coalesce(curr);
            curr = next;
        }
        self.quick_lists[index].head = 0;
        self.quick_lists[index].len = 0;
    }

    /// Population of quick list `index`, or of every quick list if `None`.
    pub fn quick_block_count(&self, size: Option<usize>) -> usize {
        match size {
            None => self.quick_lists.iter().map(|q| q.len).sum(),
            Some(want) => size_class::quick_list_index(want)
                .map(|index| self.quick_lists[index].len)
                .unwrap_or(0),
        }
    }

    /// P4 (quick-list half): every block reachable from a quick-list stack
    /// carries both `ALLOCATED` and `IN_QUICK_LIST`.
    pub fn quick_list_blocks_are_sound(&self) -> bool {
        for list in &self.quick_lists {
            let mut curr = list.head;
            while curr != 0 {
                let header = self.decode_header(curr);
                if !codec::is_allocated(header) || !codec::is_in_quick_list(header) {
                    return false;
                }
                curr = self.quick_link_next(curr);
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
        Allocator::new(TestPageProvider::new(64 * 1024, 0x1357_2468_ACE0_BDF1))
    }

    #[test]
    fn push_then_pop_round_trips_a_block() {
        let mut a = fresh_allocator();
        a.ensure_bootstrapped().unwrap();
        let block = a.find_fit(48).unwrap();
        a.free_list_remove(block);

        assert!(a.quick_list_push(block, 48));
        assert_eq!(a.quick_block_count(Some(48)), 1);

        let popped = a.quick_list_pop(size_class::quick_list_index(48).unwrap()).unwrap();
        assert_eq!(popped, block);
        assert_eq!(a.quick_block_count(Some(48)), 0);
    }

    #[test]
    fn push_beyond_max_flushes_oldest_entries() {
        let mut a = fresh_allocator();
        a.ensure_bootstrapped().unwrap();
        // Carve QUICK_LIST_MAX + 1 separate 48-byte blocks out of the
        // initial free block by splitting manually through split_and_allocate.
        let mut blocks = Vec::new();
        for _ in 0..(QUICK_LIST_MAX + 1) {
            let p = a.allocate(32).unwrap();
            blocks.push(p);
        }
        for p in &blocks {
            a.release(Some(*p));
        }
        assert_eq!(a.quick_block_count(Some(48)), QUICK_LIST_MAX);
    }
}
