// =============================================================================
// segfit — Allocator Core
// =============================================================================
//
// This module ties together the eight components of the allocator:
//
//   codec.rs       — header/footer bit layout (§4.1)
//   bootstrap.rs   — first-touch heap layout (§4.2)
//   size_class.rs  — size → list index mapping (§4.3)
//   free_list.rs   — segregated free lists (§4.4)
//   quick_list.rs  — bounded LIFO quick lists (§4.5)
//   coalesce.rs    — boundary-tag coalescing (§4.6)
//   front.rs       — allocate / release / resize (§4.7)
//   metrics.rs     — fragmentation / utilization (§4.8)
//
// `Allocator<P>` owns all of this subsystem's state for one heap. The
// process-wide default instance lives in `crate::global` over a
// `MmapPageProvider`; tests construct their own `Allocator<TestPageProvider>`
// directly so heap capacity and layout are fully controlled.
// =============================================================================

pub mod codec;
pub mod size_class;

mod bootstrap;
mod coalesce;
mod free_list;
mod front;
mod metrics;
mod quick_list;

use crate::error::AllocError;
use crate::provider::PageProvider;

/// Minimum block size in bytes: header + two link words + footer.
pub const MIN_BLOCK_SIZE: usize = 32;
/// Number of segregated free lists.
pub const N_FREE_LISTS: usize = 10;
/// Number of quick lists.
pub const N_QUICK_LISTS: usize = 10;
/// Maximum entries held in a single quick list before it is flushed.
pub const QUICK_LIST_MAX: usize = 5;

const WORD_SIZE: usize = 8;

/// A free-list sentinel: a circular doubly-linked list head that never
/// itself appears as a block in the heap. `next == self` and `prev == self`
/// mean the list is empty. Addresses of real blocks are written into these
/// fields exactly as they would be for an in-heap node; the only difference
/// between a sentinel and a block is where its link words live.
#[derive(Clone, Copy)]
struct FreeListSentinel {
    next: usize,
    prev: usize,
}

/// A quick-list stack head: `head == 0` means empty. `len` only exists so
/// flush-on-full doesn't need to walk the list to count it.
#[derive(Clone, Copy, Default)]
struct QuickList {
    head: usize,
    len: usize,
}

/// Owns one heap: the page provider backing it, the segregated free-list
/// and quick-list registries, and the payload accounting used by the
/// metrics component.
pub struct Allocator<P: PageProvider> {
    provider: P,
    magic: u64,

    /// Address of the first byte the provider committed (before padding).
    raw_start: usize,
    /// Address of the first real block (prologue start), after padding.
    heap_start: usize,
    /// Address just past the epilogue header (== provider.mem_end()).
    heap_end: usize,

    free_lists: [FreeListSentinel; N_FREE_LISTS],
    quick_lists: [QuickList; N_QUICK_LISTS],

    current_payload: u64,
    peak_payload: u64,
    total_heap_size: u64,

    last_error: Option<AllocError>,
}

impl<P: PageProvider> Allocator<P> {
    /// Creates an allocator over `provider`. The heap itself is not
    /// bootstrapped until the first `allocate()` call, matching the source
    /// allocator's lazy `create_heap()` trigger.
    pub fn new(provider: P) -> Self {
        let magic = provider.magic();
        let empty_sentinel = FreeListSentinel { next: 0, prev: 0 };
        Self {
            provider,
            magic,
            raw_start: 0,
            heap_start: 0,
            heap_end: 0,
            free_lists: [empty_sentinel; N_FREE_LISTS],
            quick_lists: [QuickList::default(); N_QUICK_LISTS],
            current_payload: 0,
            peak_payload: 0,
            total_heap_size: 0,
            last_error: None,
        }
    }

    /// Returns the last recoverable error recorded, if any. Never reset by
    /// a subsequent successful call — mirrors the source allocator's
    /// `sf_errno`, which nothing ever zeroes back out explicitly.
    pub fn last_error(&self) -> Option<AllocError> {
        self.last_error
    }

    fn is_bootstrapped(&self) -> bool {
        self.heap_start != 0
    }

    /// Cumulative bytes the page provider has committed so far
    /// (`mem_end() - mem_start()`). Zero before the first `allocate()`.
    pub fn committed_bytes(&self) -> usize {
        self.provider.mem_end() as usize - self.provider.mem_start() as usize
    }

    // -- raw word access -----------------------------------------------

    unsafe fn read_word(addr: usize) -> u64 {
        unsafe { (addr as *const u64).read_unaligned() }
    }

    unsafe fn write_word(addr: usize, word: u64) {
        unsafe { (addr as *mut u64).write_unaligned(word) }
    }

    fn decode_header(&self, addr: usize) -> u64 {
        codec::decode(unsafe { Self::read_word(addr) }, self.magic)
    }

    fn decode_footer(&self, block_addr: usize, size: usize) -> u64 {
        codec::decode(unsafe { Self::read_word(block_addr + size - WORD_SIZE) }, self.magic)
    }

    fn write_header_footer(&self, addr: usize, size: usize, plain: u64) {
        let stored = codec::encode(plain, self.magic);
        unsafe {
            Self::write_word(addr, stored);
            Self::write_word(addr + size - WORD_SIZE, stored);
        }
    }

    fn write_header_only(&self, addr: usize, plain: u64) {
        unsafe { Self::write_word(addr, codec::encode(plain, self.magic)) }
    }

    // -- link-word access (free-list body / quick-list body) -----------

    fn is_sentinel(&self, addr: usize) -> bool {
        let base = self.free_lists.as_ptr() as usize;
        let end = base + core::mem::size_of::<[FreeListSentinel; N_FREE_LISTS]>();
        addr >= base && addr < end
    }

    fn link_next(&self, addr: usize) -> usize {
        if self.is_sentinel(addr) {
            unsafe { (*(addr as *const FreeListSentinel)).next }
        } else {
            unsafe { Self::read_word(addr + WORD_SIZE) as usize }
        }
    }

    fn link_prev(&self, addr: usize) -> usize {
        if self.is_sentinel(addr) {
            unsafe { (*(addr as *const FreeListSentinel)).prev }
        } else {
            unsafe { Self::read_word(addr + 2 * WORD_SIZE) as usize }
        }
    }

    fn set_link_next(&self, addr: usize, value: usize) {
        if self.is_sentinel(addr) {
            unsafe { (*(addr as *mut FreeListSentinel)).next = value }
        } else {
            unsafe { Self::write_word(addr + WORD_SIZE, value as u64) }
        }
    }

    fn set_link_prev(&self, addr: usize, value: usize) {
        if self.is_sentinel(addr) {
            unsafe { (*(addr as *mut FreeListSentinel)).prev = value }
        } else {
            unsafe { Self::write_word(addr + 2 * WORD_SIZE, value as u64) }
        }
    }

    /// The singly-linked "next" pointer used by quick-list bodies. Lives at
    /// the same offset as a free block's doubly-linked `next` — the two
    /// link disciplines never coexist on the same block, since a block is
    /// either quick-listed or on a free list, never both.
    fn quick_link_next(&self, addr: usize) -> usize {
        unsafe { Self::read_word(addr + WORD_SIZE) as usize }
    }

    fn set_quick_link_next(&self, addr: usize, value: usize) {
        unsafe { Self::write_word(addr + WORD_SIZE, value as u64) }
    }
}

#[inline]
fn round_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// `aligned_size = max(32, round_up(n + 16, 16))` — header and footer
/// overhead total 16 bytes.
pub(crate) fn aligned_block_size(n: usize) -> usize {
    round_up(n + 16, 16).max(MIN_BLOCK_SIZE)
}

// =============================================================================
// Process-wide default instance
// =============================================================================
//
// The teacher's `KernelAllocator` wraps its `Heap` in a `SpinLock` to satisfy
// `GlobalAlloc`'s `Sync` bound, with a `static ALLOCATOR: KernelAllocator =
// KernelAllocator::new()`. We have no `const fn` path to a ready
// `MmapPageProvider` — reserving address space takes a real `mmap` call — so
// the static holds a `OnceLock` instead of being immediately usable, but the
// shape is the same: one lock-guarded instance, touched only through `with`.
// =============================================================================

use std::sync::{Mutex, OnceLock};

use crate::provider::MmapPageProvider;

static GLOBAL: OnceLock<Mutex<Allocator<MmapPageProvider>>> = OnceLock::new();

fn cell() -> &'static Mutex<Allocator<MmapPageProvider>> {
    GLOBAL.get_or_init(|| Mutex::new(Allocator::new(MmapPageProvider::default())))
}

/// Runs `f` against the process-wide allocator instance, initializing it on
/// first use. Panics only if a previous call panicked while holding the lock
/// (a poisoned mutex), which this single-threaded-by-design crate never
/// triggers in practice.
pub(crate) fn with_global<R>(f: impl FnOnce(&mut Allocator<MmapPageProvider>) -> R) -> R {
    let mut guard = cell().lock().expect("global allocator mutex poisoned");
    f(&mut guard)
}
