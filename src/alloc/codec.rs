// =============================================================================
// segfit — Block Codec
// =============================================================================
//
// Every header and footer word in the heap is stored obfuscated: the
// plaintext word XOR the process's magic constant. Decoding is a single XOR
// back; a stray zero write decodes to `magic` itself rather than a
// plausible-looking zero header, which is the whole point — it turns a
// common corruption pattern into something `size_of()` will flag as
// nonsensically large instead of silently accepting it.
//
// FLAG BITS: the source allocator this was modeled on ORs its flag bits
// directly into the same word as the block size (`block_size | ALLOCATED |
// IN_QUICK_LIST`). That only works if the flag bits fall inside the range
// that's always zero in a 16-byte-aligned size — bits 0 and 1. They live
// there, not at bit 5; a size of 48 has bit 5 set, which would otherwise
// collide with a higher flag bit on every other size class.
// =============================================================================

use bitflags::bitflags;

bitflags! {
    /// The low two bits of a header/footer word, once the word has been
    /// unmasked from the size and payload fields it's packed alongside.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u64 {
        /// Set for both live and quick-listed blocks; clear only on a
        /// block sitting in a segregated free list.
        const ALLOCATED = 1 << 0;
        /// Set only while the block sits in a quick list.
        const IN_QUICK_LIST = 1 << 1;
    }
}

/// Masks the low 32 bits down to the block-size field (always a multiple of
/// 16; bits 0-3 are reserved for flags and alignment).
const SIZE_MASK: u64 = 0xFFFF_FFFF & !0xF;

/// XORs a word with the process magic. Encoding and decoding are the same
/// operation — the function name is chosen at each call site for clarity.
#[inline]
pub fn decode(word: u64, magic: u64) -> u64 {
    word ^ magic
}

#[inline]
pub fn encode(word: u64, magic: u64) -> u64 {
    word ^ magic
}

/// Extracts the block size (header bytes + payload + padding + footer) from
/// an already-decoded word.
#[inline]
pub fn size_of(decoded: u64) -> usize {
    (decoded & SIZE_MASK) as usize
}

/// Extracts the requested payload size from an already-decoded word. Zero
/// for free and quick-listed blocks.
#[inline]
pub fn payload_of(decoded: u64) -> usize {
    (decoded >> 32) as usize
}

#[inline]
fn flags_of(decoded: u64) -> BlockFlags {
    BlockFlags::from_bits_truncate(decoded)
}

#[inline]
pub fn is_allocated(decoded: u64) -> bool {
    flags_of(decoded).contains(BlockFlags::ALLOCATED)
}

#[inline]
pub fn is_in_quick_list(decoded: u64) -> bool {
    flags_of(decoded).contains(BlockFlags::IN_QUICK_LIST)
}

/// Builds a plaintext header/footer word for a free block: no flags, no
/// payload.
#[inline]
pub fn make_free_header(size: usize) -> u64 {
    size as u64 & SIZE_MASK
}

/// Builds a plaintext header/footer word for a live, allocated block.
#[inline]
pub fn make_allocated_header(size: usize, payload: usize) -> u64 {
    ((payload as u64) << 32) | (size as u64 & SIZE_MASK) | BlockFlags::ALLOCATED.bits()
}

/// Builds a plaintext header/footer word for a block parked in a quick
/// list: flagged both allocated and quick-listed, payload zeroed.
#[inline]
pub fn make_quicklist_header(size: usize) -> u64 {
    (size as u64 & SIZE_MASK) | (BlockFlags::ALLOCATED | BlockFlags::IN_QUICK_LIST).bits()
}
