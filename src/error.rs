// =============================================================================
// segfit — Error Surface
// =============================================================================
//
// There is exactly one recoverable failure mode (the page provider refused
// to grow the heap) and one unrecoverable one (a corrupted block reached the
// coalescer or a quick-list pop). The unrecoverable case is not a `Result`:
// continuing after a broken boundary tag would silently corrupt further
// allocations, so it goes straight to `process::abort()`.
// =============================================================================

use core::fmt;

/// Recoverable allocator failure, reported through `last_error()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The page provider could not grant another page; the allocator is
    /// otherwise unharmed and remains usable.
    OutOfMemory,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl core::error::Error for AllocError {}

/// Aborts the process after logging the invariant that was violated.
///
/// Called only from contexts where continuing would operate on a heap the
/// allocator can no longer trust: a quick-list block popped without its
/// expected flag combination, or a header/footer mismatch found during
/// coalescing (spec invariants I3/I4).
pub(crate) fn corrupted(what: &str) -> ! {
    log::error!("heap corruption detected: {what}");
    std::process::abort()
}
