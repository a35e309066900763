// =============================================================================
// segfit — A Segregated Free-List Allocator
// =============================================================================
//
// A user-space heap allocator: segregated size-class free lists with
// boundary-tag coalescing, small bounded quick lists ahead of the general
// path, and on-demand page growth behind a swappable `PageProvider`.
//
// This crate does not register a `#[global_allocator]` — it is a library
// allocator a caller drives explicitly through `allocate`/`release`/`resize`,
// not a drop-in replacement for Rust's own heap. Single-threaded by design:
// every public function here synchronizes on one process-wide instance, but
// nothing about the allocator itself is designed for concurrent mutation, so
// treat it as one logical thread's heap even though the lock makes calling
// it from several threads memory-safe.
// =============================================================================

mod alloc;
pub mod error;
pub mod introspect;
pub mod provider;

pub use alloc::Allocator;
pub use error::AllocError;

/// Allocates `n` bytes of payload, bootstrapping the process-wide heap on
/// first use. Returns `None` if `n == 0` or if the heap could not grow to
/// satisfy the request — check [`last_error`] to tell the two apart.
pub fn allocate(n: usize) -> Option<usize> {
    alloc::with_global(|a| a.allocate(n))
}

/// Releases a pointer previously returned by [`allocate`] or [`resize`].
/// `None` is a no-op.
pub fn release(p: Option<usize>) {
    alloc::with_global(|a| a.release(p))
}

/// Resizes the allocation at `p` to `n` bytes, preserving
/// `min(n, old payload)` bytes of content. `p == None` behaves as
/// [`allocate`]; `n == 0` behaves as [`release`] and returns `None`.
pub fn resize(p: Option<usize>, n: usize) -> Option<usize> {
    alloc::with_global(|a| a.resize(p, n))
}

/// Fraction of allocated heap bytes currently holding live client payload.
pub fn fragmentation() -> f64 {
    alloc::with_global(|a| a.fragmentation())
}

/// Peak payload ever held, divided by the cumulative bytes the page
/// provider has granted. Monotonically shaped relative to heap growth —
/// it never shrinks back down after a release the way `fragmentation` does.
pub fn utilization() -> f64 {
    alloc::with_global(|a| a.utilization())
}

/// The last recoverable error recorded by the process-wide allocator, if
/// any. Never cleared by a subsequent successful call.
pub fn last_error() -> Option<AllocError> {
    alloc::with_global(|a| a.last_error())
}
