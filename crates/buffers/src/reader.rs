//! Little-endian buffer reader with cursor tracking.

use crate::BufferError;

/// A binary buffer reader over a borrowed byte slice.
///
/// The cursor `x` is an absolute offset into `uint8`, so readers produced by
/// [`Reader::cut`] report positions relative to the original buffer. Reads
/// never cross `end`.
///
/// # Example
///
/// ```
/// use bsonkit_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.size(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end - self.x
    }

    /// Returns `true` when the cursor has reached the end position.
    pub fn is_empty(&self) -> bool {
        self.x >= self.end
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        if self.is_empty() {
            return Err(BufferError::EndOfBuffer);
        }
        Ok(self.uint8[self.x])
    }

    fn assert_size(&self, n: usize) -> Result<(), BufferError> {
        if n > self.size() {
            return Err(BufferError::EndOfBuffer);
        }
        Ok(())
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.assert_size(length)?;
        self.x += length;
        Ok(())
    }

    /// Returns a subarray of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.assert_size(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..self.x])
    }

    /// Returns a fixed-size array and advances the cursor.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.buf(N)?);
        Ok(out)
    }

    /// Creates a reader over the next `size` bytes and advances past them.
    pub fn cut(&mut self, size: usize) -> Result<Reader<'a>, BufferError> {
        self.assert_size(size)?;
        let slice = Reader {
            uint8: self.uint8,
            x: self.x,
            end: self.x + size,
        };
        self.x += size;
        Ok(slice)
    }

    /// Reads bytes up to the next NUL and consumes the NUL.
    ///
    /// The returned slice excludes the terminator.
    pub fn cstr(&mut self) -> Result<&'a [u8], BufferError> {
        let rest = &self.uint8[self.x..self.end];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BufferError::MissingNul)?;
        self.x += len + 1;
        Ok(&rest[..len])
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        let val = self.peek()?;
        self.x += 1;
        Ok(val)
    }

    /// Reads a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Reads a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    /// Reads a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.array()?))
    }
}
