//! Shared in-buffer pattern search.
//!
//! Every extractor consumes the same lazy sequence of match offsets instead
//! of hand-rolling "indexOf from offset, advance, repeat" loops. Built on
//! memchr's SIMD-accelerated memmem finder.

use memchr::memmem;

/// All non-overlapping occurrences of `needle` in `haystack`, left to right.
pub fn find_all<'h, 'n>(haystack: &'h [u8], needle: &'n [u8]) -> memmem::FindIter<'h, 'n> {
    memmem::find_iter(haystack, needle)
}

/// First occurrence of `needle` at or after `start`, as an absolute offset.
pub fn find_from(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if start >= haystack.len() {
        return None;
    }
    memmem::find(&haystack[start..], needle).map(|p| p + start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_non_overlapping() {
        let hay = b"aaaa";
        let hits: Vec<usize> = find_all(hay, b"aa").collect();
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn test_find_all_order() {
        let hay = b"x..x..x";
        let hits: Vec<usize> = find_all(hay, b"x").collect();
        assert_eq!(hits, vec![0, 3, 6]);
    }

    #[test]
    fn test_find_from() {
        let hay = b"..ab..ab";
        assert_eq!(find_from(hay, b"ab", 0), Some(2));
        assert_eq!(find_from(hay, b"ab", 3), Some(6));
        assert_eq!(find_from(hay, b"ab", 7), None);
        assert_eq!(find_from(hay, b"ab", 100), None);
    }
}
