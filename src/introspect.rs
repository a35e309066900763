// =============================================================================
// segfit — Introspection
// =============================================================================
//
// Read-only windows into the block registries, for callers that want to
// reason about fragmentation or tune request patterns without reaching into
// the allocator's internals (which are not exposed at all outside this
// crate).
// =============================================================================

use crate::alloc;

/// Number of free blocks currently registered, optionally filtered to a
/// single block size. `None` counts every free block regardless of size.
pub fn free_block_count(size: Option<usize>) -> usize {
    alloc::with_global(|a| a.free_block_count(size))
}

/// Number of quick-listed blocks currently registered, optionally filtered
/// to a single block size.
pub fn quick_block_count(size: Option<usize>) -> usize {
    alloc::with_global(|a| a.quick_block_count(size))
}
