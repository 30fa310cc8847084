//! Bounds-checked typed reads over an immutable byte buffer.
//!
//! All multi-byte reads are little-endian, matching the film wire format.
//! Reads past the buffer end fail with [`Error::OutOfBounds`] instead of
//! returning undefined data.

use memchr::memmem;

use crate::{Error, Result};

/// Sequential/random-access reader over a borrowed byte buffer.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position in bytes.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes remaining after the current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute offset. Seeking to the buffer end is allowed;
    /// seeking past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(self.out_of_bounds(offset, 0));
        }
        self.pos = offset;
        Ok(())
    }

    /// Advance the position by `count` bytes without reading them.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        match self.pos.checked_add(count) {
            Some(target) => self.seek(target),
            None => Err(self.out_of_bounds(self.pos, count)),
        }
    }

    fn out_of_bounds(&self, offset: usize, needed: usize) -> Error {
        Error::OutOfBounds {
            offset,
            needed,
            len: self.data.len(),
        }
    }

    /// Take `count` bytes starting at the current position, advancing past
    /// them.
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let slice = self.slice_at(self.pos, count)?;
        self.pos += count;
        Ok(slice)
    }

    fn slice_at(&self, offset: usize, count: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(count).unwrap_or(usize::MAX);
        if end > self.data.len() {
            return Err(self.out_of_bounds(offset, count));
        }
        Ok(&self.data[offset..end])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a fixed-length byte slice, advancing past it.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    /// Read a null-terminated ASCII string, stopping at `max_len` bytes or
    /// the buffer end, whichever comes first. The position advances past
    /// the terminator when one was found.
    pub fn read_cstr(&mut self, max_len: usize) -> Result<String> {
        let window_len = max_len.min(self.remaining());
        let window = self.slice_at(self.pos, window_len)?;

        match memchr::memchr(0, window) {
            Some(end) => {
                let s = String::from_utf8_lossy(&window[..end]).into_owned();
                self.pos += end + 1;
                Ok(s)
            }
            None => {
                let s = String::from_utf8_lossy(window).into_owned();
                self.pos += window_len;
                Ok(s)
            }
        }
    }

    /// Read a UTF-16LE string of exactly `byte_len` bytes, terminated at
    /// the first two-byte zero pair. The position always advances by
    /// `byte_len`.
    pub fn read_utf16(&mut self, byte_len: usize) -> Result<String> {
        let raw = self.take(byte_len)?;
        let mut units = Vec::with_capacity(byte_len / 2);
        for pair in raw.chunks_exact(2) {
            let unit = u16::from_le_bytes([pair[0], pair[1]]);
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Non-advancing read of a u16 at the current position.
    pub fn peek_u16(&self) -> Result<u16> {
        let b = self.slice_at(self.pos, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Non-advancing read of a u32 at the current position.
    pub fn peek_u32(&self) -> Result<u32> {
        let b = self.slice_at(self.pos, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Non-advancing read of `count` bytes at `rel` bytes past the current
    /// position.
    pub fn peek_bytes(&self, rel: usize, count: usize) -> Result<&'a [u8]> {
        let offset = self.pos.checked_add(rel).unwrap_or(usize::MAX);
        self.slice_at(offset, count)
    }

    /// Find the next occurrence of `pattern` at or after the current
    /// position. Returns the absolute offset, without moving the cursor.
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        self.find_from(pattern, self.pos)
    }

    /// Find the next occurrence of `pattern` at or after `offset`.
    pub fn find_from(&self, pattern: &[u8], offset: usize) -> Option<usize> {
        if offset >= self.data.len() {
            return None;
        }
        memmem::find(&self.data[offset..], pattern).map(|p| p + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_reads_advance() {
        let data = [
            0x01, // u8
            0x34, 0x12, // u16
            0x78, 0x56, 0x34, 0x12, // u32
            0xff, 0xff, 0xff, 0xff, // i32 = -1
            0x00, 0x00, 0x80, 0x3f, // f32 = 1.0
        ];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u32().unwrap(), 0x12345678);
        assert_eq!(c.read_i32().unwrap(), -1);
        assert_eq!(c.read_f32().unwrap(), 1.0);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_read_u64() {
        let data = 0xdead_beef_cafe_f00du64.to_le_bytes();
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u64().unwrap(), 0xdead_beef_cafe_f00d);
    }

    #[test]
    fn test_out_of_bounds_read() {
        let data = [0x01, 0x02];
        let mut c = ByteCursor::new(&data);
        assert!(matches!(c.read_u32(), Err(Error::OutOfBounds { .. })));
        // Position did not advance on failure
        assert_eq!(c.position(), 0);
        assert_eq!(c.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_seek_and_skip() {
        let data = [0u8; 10];
        let mut c = ByteCursor::new(&data);
        c.seek(10).unwrap();
        assert!(c.seek(11).is_err());
        c.seek(4).unwrap();
        c.skip(6).unwrap();
        assert!(c.skip(1).is_err());
        assert_eq!(c.position(), 10);
    }

    #[test]
    fn test_skip_overflow_reports_position() {
        let data = [0u8; 4];
        let mut c = ByteCursor::new(&data);
        c.seek(2).unwrap();
        match c.skip(usize::MAX) {
            Err(Error::OutOfBounds {
                offset,
                needed,
                len,
            }) => {
                assert_eq!(offset, 2);
                assert_eq!(needed, usize::MAX);
                assert_eq!(len, 4);
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
        assert_eq!(c.position(), 2);
    }

    #[test]
    fn test_read_cstr() {
        let data = b"weapon\0trailing";
        let mut c = ByteCursor::new(data);
        assert_eq!(c.read_cstr(32).unwrap(), "weapon");
        assert_eq!(c.position(), 7);
    }

    #[test]
    fn test_read_cstr_max_len_and_unterminated() {
        let data = b"abcdef";
        let mut c = ByteCursor::new(data);
        assert_eq!(c.read_cstr(4).unwrap(), "abcd");
        assert_eq!(c.position(), 4);
        // No terminator before buffer end
        assert_eq!(c.read_cstr(32).unwrap(), "ef");
        assert_eq!(c.position(), 6);
    }

    #[test]
    fn test_read_utf16() {
        let mut data = Vec::new();
        for unit in "Tag".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&[0x00, 0x00, 0x41, 0x00]); // zero pair, then garbage
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_utf16(data.len()).unwrap(), "Tag");
        // Always advances the full declared length
        assert_eq!(c.position(), data.len());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let data = [0x0d, 0xf0, 0xad, 0xde];
        let c = ByteCursor::new(&data);
        assert_eq!(c.peek_u16().unwrap(), 0xf00d);
        assert_eq!(c.peek_u32().unwrap(), 0xdeadf00d);
        assert_eq!(c.peek_bytes(2, 2).unwrap(), &[0xad, 0xde]);
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_find_pattern() {
        let data = b"....needle....needle..";
        let mut c = ByteCursor::new(data);
        assert_eq!(c.find(b"needle"), Some(4));
        c.seek(5).unwrap();
        assert_eq!(c.find(b"needle"), Some(14));
        assert_eq!(c.find_from(b"needle", 15), None);
        assert_eq!(c.find(b"missing"), None);
    }
}
