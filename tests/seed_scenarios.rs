// =============================================================================
// segfit — Seed Scenario Tests
// =============================================================================
//
// Each test below is one literal request sequence checked against the exact
// byte counts it should produce. Every `Allocator` here is a fresh,
// independently reserved instance (not the process-wide singleton in
// `lib.rs`), so scenarios never interact with each other even when the test
// binary runs them concurrently.
// =============================================================================

use segfit::provider::MmapPageProvider;
use segfit::{AllocError, Allocator};

const PAGE: usize = 4096;

fn heap(max_bytes: usize) -> Allocator<MmapPageProvider> {
    Allocator::new(MmapPageProvider::new(max_bytes).expect("mmap reservation failed"))
}

#[test]
fn single_int() {
    let mut a = heap(16 * PAGE);
    let p = a.allocate(4);
    assert!(p.is_some());
    assert_eq!(a.quick_block_count(None), 0);
    assert_eq!(a.free_block_count(Some(4016)), 1);
    assert_eq!(a.last_error(), None);
    assert_eq!(a.committed_bytes(), PAGE);
}

#[test]
fn too_large_exhausts_a_small_reservation() {
    // Two pages total: one for bootstrap, one more page of growth before
    // the reservation runs out. The accumulated free block's size follows
    // deterministically from that capacity (2 * PAGE - pad - prologue -
    // epilogue word = 8192 - 8 - 32 - 8 = 8144).
    let mut a = heap(2 * PAGE);
    let p = a.allocate(1_000_000);
    assert_eq!(p, None);
    assert_eq!(a.last_error(), Some(AllocError::OutOfMemory));
    assert_eq!(a.free_block_count(Some(8144)), 1);
}

#[test]
fn quick_release() {
    let mut a = heap(16 * PAGE);
    a.allocate(8).unwrap();
    let y = a.allocate(32).unwrap();
    a.allocate(1).unwrap();
    a.release(Some(y));

    assert_eq!(a.quick_block_count(None), 1);
    assert_eq!(a.free_block_count(Some(3936)), 1);
}

#[test]
fn coalesce_across_a_freed_gap() {
    let mut a = heap(16 * PAGE);
    a.allocate(8).unwrap();
    let x = a.allocate(200).unwrap();
    let y = a.allocate(300).unwrap();
    a.allocate(4).unwrap();
    a.release(Some(y));
    a.release(Some(x));

    assert_eq!(a.quick_block_count(None), 0);
    assert_eq!(a.free_block_count(Some(544)), 1);
    assert_eq!(a.free_block_count(Some(3440)), 1);
}

#[test]
fn resize_that_grows_moves_and_quick_lists_the_remnant() {
    let mut a = heap(16 * PAGE);
    let x = a.allocate(4).unwrap();
    a.allocate(10).unwrap();
    let resized = a.resize(Some(x), 80);

    assert!(resized.is_some());
    assert_eq!(a.quick_block_count(None), 1);
    assert_eq!(a.free_block_count(Some(3888)), 1);
}

#[test]
fn resize_into_a_splinter_keeps_the_same_block() {
    let mut a = heap(16 * PAGE);
    let x = a.allocate(80).unwrap();
    let before = a.free_block_count(Some(3952));
    let y = a.resize(Some(x), 64);

    assert_eq!(y, Some(x));
    assert_eq!(a.free_block_count(Some(3952)), before);
}
