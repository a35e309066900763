// =============================================================================
// segfit — Allocator Front-End
// =============================================================================
//
// `allocate`, `release`, and `resize` are the only entry points a client
// ever calls. Everything below them — bootstrap, the two registries, the
// coalescer — exists to make these three operations correct and fast.
// =============================================================================

use super::{aligned_block_size, codec, size_class, Allocator, MIN_BLOCK_SIZE, WORD_SIZE};
use crate::error::AllocError;
use crate::provider::{PageProvider, PAGE_SIZE};

impl<P: PageProvider> Allocator<P> {
    #[inline]
    fn payload_ptr(&self, block_addr: usize) -> usize {
        block_addr + WORD_SIZE
    }

    #[inline]
    fn block_of(&self, payload_addr: usize) -> usize {
        payload_addr - WORD_SIZE
    }

    fn bump_payload(&mut self, payload: usize) {
        self.current_payload += payload as u64;
        if self.current_payload > self.peak_payload {
            self.peak_payload = self.current_payload;
        }
    }

    /// Requests `n` bytes of payload. Returns `None` (and records
    /// [`AllocError::OutOfMemory`] in `last_error()`) only if the page
    /// provider cannot grant another page; `allocate(0)` also returns
    /// `None`, silently — that is not an error.
    pub fn allocate(&mut self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        if self.ensure_bootstrapped().is_err() {
            return None;
        }

        let aligned_size = aligned_block_size(n);

        if let Some(index) = size_class::quick_list_index(aligned_size) {
            if self.quick_lists[index].len > 0 {
                let block = self
                    .quick_list_pop(index)
                    .expect("len > 0 implies a non-empty quick list head");
                self.write_header_footer(block, aligned_size, codec::make_allocated_header(aligned_size, n));
                self.bump_payload(n);
                return Some(self.payload_ptr(block));
            }
        }

        loop {
            if let Some(block) = self.find_fit(aligned_size) {
                let block = self.split_and_allocate(block, aligned_size, n);
                return Some(self.payload_ptr(block));
            }
            if self.grow_heap().is_err() {
                return None;
            }
        }
    }

    /// Carves `want` bytes off `block` (already removed-eligible: a fit
    /// the caller just found) and returns the allocated block's address.
    /// If the remainder would be a splinter (< [`MIN_BLOCK_SIZE`]), the
    /// whole block is handed over instead of split.
    fn split_and_allocate(&mut self, block: usize, want: usize, payload: usize) -> usize {
        let size = codec::size_of(self.decode_header(block));
        let leftover = size - want;
        self.free_list_remove(block);

        let effective_size = if leftover >= MIN_BLOCK_SIZE {
            let tail = block + want;
            self.set_link_next(tail, 0);
            self.set_link_prev(tail, 0);
            self.write_header_footer(tail, leftover, codec::make_free_header(leftover));
            self.free_list_insert(tail);
            want
        } else {
            size
        };

        self.write_header_footer(block, effective_size, codec::make_allocated_header(effective_size, payload));
        self.bump_payload(payload);
        block
    }

    /// Extends the heap by one page, folding the new region into whatever
    /// was the final block before growth (coalescing if it was free).
    fn grow_heap(&mut self) -> Result<(), AllocError> {
        let old_epilogue_addr = self.heap_end - WORD_SIZE;

        if self.provider.grow().is_none() {
            self.last_error = Some(AllocError::OutOfMemory);
            return Err(AllocError::OutOfMemory);
        }
        self.total_heap_size += PAGE_SIZE as u64;

        let new_block_addr = old_epilogue_addr;
        let new_block_size = PAGE_SIZE;
        let new_epilogue_addr = new_block_addr + new_block_size;
        self.write_header_only(new_epilogue_addr, codec::make_allocated_header(0, 0));
        self.heap_end = new_epilogue_addr + WORD_SIZE;

        self.set_link_next(new_block_addr, 0);
        self.set_link_prev(new_block_addr, 0);
        self.write_header_footer(new_block_addr, new_block_size, codec::make_free_header(new_block_size));
        self.coalesce(new_block_addr);
        Ok(())
    }

    /// Releases a previously allocated (or `None`) payload pointer. A
    /// `None` argument is a no-op, matching `release`'s contract for a
    /// pointer that was never returned by `allocate`/`resize`.
    pub fn release(&mut self, p: Option<usize>) {
        let Some(p) = p else { return };
        let block = self.block_of(p);
        let header = self.decode_header(block);
        let size = codec::size_of(header);
        let payload = codec::payload_of(header);

        self.current_payload -= payload as u64;

        if self.quick_list_push(block, size) {
            return;
        }

        self.set_link_next(block, 0);
        self.set_link_prev(block, 0);
        self.write_header_footer(block, size, codec::make_free_header(size));
        self.coalesce(block);
    }

    /// Resizes the allocation at `p` to `n` bytes, preserving
    /// `min(n, old payload)` bytes of content. `p == None` behaves as
    /// `allocate(n)`; `n == 0` behaves as `release(p)` and returns `None`.
    pub fn resize(&mut self, p: Option<usize>, n: usize) -> Option<usize> {
        let Some(p) = p else { return self.allocate(n) };
        if n == 0 {
            self.release(Some(p));
            return None;
        }

        let block = self.block_of(p);
        let header = self.decode_header(block);
        let current_size = codec::size_of(header);
        let old_payload = codec::payload_of(header);
        let aligned = aligned_block_size(n);

        if aligned > current_size {
            // Grows via a fresh allocation; `allocate`'s own split path
            // accounts for the new block's payload exactly once, so we do
            // not add a second increment here (see DESIGN.md).
            let q = self.allocate(n)?;
            let copy_len = n.min(old_payload);
            unsafe {
                std::ptr::copy_nonoverlapping(p as *const u8, q as *mut u8, copy_len);
            }
            self.release(Some(p));
            return Some(q);
        }

        if current_size - aligned < MIN_BLOCK_SIZE {
            self.current_payload = self.current_payload - old_payload as u64 + n as u64;
            if self.current_payload > self.peak_payload {
                self.peak_payload = self.current_payload;
            }
            self.write_header_footer(block, current_size, codec::make_allocated_header(current_size, n));
            return Some(p);
        }

        let tail = block + aligned;
        let tail_size = current_size - aligned;
        self.current_payload = self.current_payload - old_payload as u64 + n as u64;
        if self.current_payload > self.peak_payload {
            self.peak_payload = self.current_payload;
        }
        self.write_header_footer(block, aligned, codec::make_allocated_header(aligned, n));
        self.set_link_next(tail, 0);
        self.set_link_prev(tail, 0);
        self.write_header_footer(tail, tail_size, codec::make_free_header(tail_size));
        self.coalesce(tail);
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_util::TestPageProvider;

    fn fresh_allocator() -> Allocator<TestPageProvider> {
        Allocator::new(TestPageProvider::new(1024 * 1024, 0x0F0F_F0F0_1234_5678))
    }

    #[test]
    fn allocate_zero_returns_none_without_error() {
        let mut a = fresh_allocator();
        assert_eq!(a.allocate(0), None);
        assert_eq!(a.last_error(), None);
    }

    #[test]
    fn release_of_none_is_a_no_op() {
        let mut a = fresh_allocator();
        a.release(None);
    }

    #[test]
    fn resize_smaller_keeps_the_same_pointer_and_content() {
        let mut a = fresh_allocator();
        let p = a.allocate(80).unwrap();
        unsafe {
            std::ptr::write_bytes(p as *mut u8, 0xAB, 64);
        }
        let q = a.resize(Some(p), 64).unwrap();
        assert_eq!(p, q);
        let byte = unsafe { *(q as *const u8) };
        assert_eq!(byte, 0xAB);
    }

    #[test]
    fn resize_larger_preserves_old_content_and_moves() {
        let mut a = fresh_allocator();
        let p = a.allocate(8).unwrap();
        unsafe {
            (p as *mut u32).write_unaligned(0xCAFEBABE);
        }
        let q = a.resize(Some(p), 80).unwrap();
        let value = unsafe { (q as *const u32).read_unaligned() };
        assert_eq!(value, 0xCAFEBABE);
    }

    #[test]
    fn allocate_then_release_then_reallocate_same_size_succeeds() {
        let mut a = fresh_allocator();
        let p = a.allocate(40).unwrap();
        a.release(Some(p));
        assert!(a.allocate(40).is_some());
    }
}
