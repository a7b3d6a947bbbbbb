//! Little-endian auto-growing buffer writer.

/// A binary writer backed by a plain `Vec<u8>`.
///
/// Besides appending, the writer can patch a previously reserved `i32` slot
/// and roll back to an earlier length, which is what length-prefixed formats
/// need.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    uint8: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { uint8: Vec::new() }
    }

    /// Creates an empty writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Read-only view of the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    /// Clears the writer, keeping its allocation.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Drops everything written after position `len`.
    pub fn truncate(&mut self, len: usize) {
        self.uint8.truncate(len);
    }

    /// Takes the written bytes out of the writer, leaving it empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Appends raw bytes.
    #[inline]
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }

    /// Overwrites four bytes at `pos` with a little-endian `i32`.
    ///
    /// # Panics
    ///
    /// Panics if `pos + 4` exceeds the written length.
    pub fn patch_i32(&mut self, pos: usize, val: i32) {
        self.uint8[pos..pos + 4].copy_from_slice(&val.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_i32() {
        let mut w = Writer::new();
        w.i32(0);
        w.u8(0xAA);
        w.patch_i32(0, 5);
        assert_eq!(w.flush(), vec![5, 0, 0, 0, 0xAA]);
        assert!(w.is_empty());
    }

    #[test]
    fn test_truncate_rolls_back() {
        let mut w = Writer::new();
        w.u8(1);
        let mark = w.len();
        w.i64(-1);
        w.truncate(mark);
        assert_eq!(w.as_slice(), &[1]);
    }
}
