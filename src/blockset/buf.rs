//! Capacity-bounded output buffers.

/// Indicates that a write would have run past the end of a `BoundedWriter`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Overflow {
  /// The number of bytes the rejected write needed.
  pub requested: usize,
  /// The number of bytes that were still free.
  pub remaining: usize,
}

/// A write cursor over a caller-owned slice.
///
/// The slice's length is a hard limit: a write that does not fit in full is
/// rejected before any of its bytes are copied, so the slice is never
/// modified past the cursor.
#[derive(Debug)]
pub struct BoundedWriter<'a> {
  buf: &'a mut [u8],
  pos: usize,
}

impl<'a> BoundedWriter<'a> {
  /// Creates a new `BoundedWriter` at the start of `buf`.
  pub fn new(buf: &'a mut [u8]) -> Self {
    Self { buf, pos: 0 }
  }

  /// Returns the total capacity of the underlying slice.
  pub fn capacity(&self) -> usize {
    self.buf.len()
  }

  /// Returns the number of bytes written so far.
  pub fn len(&self) -> usize {
    self.pos
  }

  /// Returns true if nothing has been written.
  pub fn is_empty(&self) -> bool {
    self.pos == 0
  }

  /// Returns the number of bytes that may still be written.
  pub fn remaining(&self) -> usize {
    self.buf.len() - self.pos
  }

  /// Writes all of `bytes`, or nothing at all.
  pub fn put(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
    if bytes.len() > self.remaining() {
      return Err(Overflow {
        requested: bytes.len(),
        remaining: self.remaining(),
      });
    }
    self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
    self.pos += bytes.len();
    Ok(())
  }

  /// Consumes the writer, returning the bytes written.
  pub fn into_written(self) -> &'a mut [u8] {
    let BoundedWriter { buf, pos } = self;
    &mut buf[..pos]
  }
}
