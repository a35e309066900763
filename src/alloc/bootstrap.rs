// =============================================================================
// segfit — Heap Bootstrap
// =============================================================================
//
// Lays down the heap's fixed boundary tags on first touch:
//
//   [ pad? ][ prologue: 32B ALLOCATED ][ free block ][ epilogue: header only ]
//
// The prologue and epilogue exist purely so every real block has both a
// predecessor and a successor to interrogate during coalescing — without
// them the coalescer would need special-cased bounds checks at both ends
// of the heap instead of a uniform "read the neighbor" rule.
// =============================================================================

use super::{codec, Allocator, FreeListSentinel, N_FREE_LISTS, WORD_SIZE};
use crate::error::AllocError;
use crate::provider::{PageProvider, PAGE_SIZE};

const PROLOGUE_SIZE: usize = 32;

impl<P: PageProvider> Allocator<P> {
    /// Idempotent: a no-op once the heap has already been bootstrapped.
    pub(crate) fn ensure_bootstrapped(&mut self) -> Result<(), AllocError> {
        if self.is_bootstrapped() {
            return Ok(());
        }
        self.bootstrap()
    }

    fn bootstrap(&mut self) -> Result<(), AllocError> {
        let raw_start = self.provider.mem_start() as usize;
        let grown = self.provider.grow().ok_or_else(|| {
            self.last_error = Some(AllocError::OutOfMemory);
            AllocError::OutOfMemory
        })?;
        debug_assert_eq!(grown as usize, raw_start);
        self.total_heap_size += PAGE_SIZE as u64;
        self.raw_start = raw_start;

        // Pad so the first payload pointer lands 16-aligned, mirroring the
        // source allocator's own conditional (kept as a branch rather than
        // a hard-coded 8, per spec §9's note on this exact assumption).
        let pad = if raw_start % 16 == 0 { 8 } else { 0 };

        let prologue_addr = raw_start + pad;
        self.write_header_footer(
            prologue_addr,
            PROLOGUE_SIZE,
            codec::make_allocated_header(PROLOGUE_SIZE, 0),
        );

        let free_addr = prologue_addr + PROLOGUE_SIZE;
        let free_size = PAGE_SIZE - pad - PROLOGUE_SIZE - WORD_SIZE;
        self.write_header_footer(free_addr, free_size, codec::make_free_header(free_size));

        let epilogue_addr = free_addr + free_size;
        self.write_header_only(epilogue_addr, codec::make_allocated_header(0, 0));

        self.heap_start = prologue_addr;
        self.heap_end = epilogue_addr + WORD_SIZE;

        for i in 0..N_FREE_LISTS {
            let sentinel_addr = &self.free_lists[i] as *const FreeListSentinel as usize;
            self.free_lists[i] = FreeListSentinel { next: sentinel_addr, prev: sentinel_addr };
        }

        self.free_list_insert(free_addr);
        Ok(())
    }
}
