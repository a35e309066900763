// =============================================================================
// segfit — Size-Class Index
// =============================================================================

use super::{MIN_BLOCK_SIZE, N_FREE_LISTS, N_QUICK_LISTS};

/// Maps a block size to the segregated free-list it belongs to.
///
/// Starting from [`MIN_BLOCK_SIZE`] and doubling, returns the smallest index
/// `i < N_FREE_LISTS - 1` whose class ceiling (`MIN_BLOCK_SIZE * 2^i`) is
/// `>= size`; everything larger falls into the last list as a catch-all.
pub fn free_list_index(size: usize) -> usize {
    let mut index = 0;
    let mut class_ceiling = MIN_BLOCK_SIZE;
    while index < N_FREE_LISTS - 1 && size > class_ceiling {
        class_ceiling *= 2;
        index += 1;
    }
    index
}

/// Maps a block size to its quick-list index, if the size is small enough
/// to be quick-listable at all (`MIN_BLOCK_SIZE ..= MIN_BLOCK_SIZE + 16 *
/// (N_QUICK_LISTS - 1)`, in steps of 16).
pub fn quick_list_index(size: usize) -> Option<usize> {
    let ceiling = MIN_BLOCK_SIZE + 16 * (N_QUICK_LISTS - 1);
    if size < MIN_BLOCK_SIZE || size > ceiling {
        return None;
    }
    Some((size - MIN_BLOCK_SIZE) / 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_list_index_doubles_from_min_block_size() {
        assert_eq!(free_list_index(32), 0);
        assert_eq!(free_list_index(33), 1);
        assert_eq!(free_list_index(64), 1);
        assert_eq!(free_list_index(65), 2);
    }

    #[test]
    fn free_list_index_caps_at_last_list() {
        assert_eq!(free_list_index(10_000_000), N_FREE_LISTS - 1);
    }

    #[test]
    fn quick_list_index_bounds() {
        assert_eq!(quick_list_index(31), None);
        assert_eq!(quick_list_index(32), Some(0));
        assert_eq!(quick_list_index(48), Some(1));
        let ceiling = MIN_BLOCK_SIZE + 16 * (N_QUICK_LISTS - 1);
        assert_eq!(quick_list_index(ceiling), Some(N_QUICK_LISTS - 1));
        assert_eq!(quick_list_index(ceiling + 16), None);
    }
}
