#![forbid(unsafe_code)]

//! The byte stream collaborators that the codec reads from and writes to.
//!
//! The decoder only ever reads forward. It never seeks, so a network socket
//! works as well as a file.

use alloc::vec::Vec;

use crate::PngResult;

/// A forward-only source of bytes.
pub trait ByteSource {
  /// Fills as much of `buf` as possible, returning how many bytes were
  /// written.
  ///
  /// A return value less than `buf.len()` means that the stream has run dry
  /// (or become unreadable). The decoder treats that as the end of the
  /// stream and will not call again expecting more.
  fn read_bytes(&mut self, buf: &mut [u8]) -> usize;

  /// The number of bytes consumed so far.
  fn position(&self) -> u64;
}

/// A destination for encoded bytes.
pub trait ByteSink {
  /// Writes all of `bytes`, or fails.
  fn write_bytes(&mut self, bytes: &[u8]) -> PngResult<()>;
}

/// Reads out of an in-memory byte slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceSource<'b> {
  spare: &'b [u8],
  position: u64,
}
impl<'b> SliceSource<'b> {
  /// Makes a source that begins at the start of `bytes`.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { spare: bytes, position: 0 }
  }

  /// The bytes not yet read.
  #[inline]
  #[must_use]
  pub const fn remaining(&self) -> &'b [u8] {
    self.spare
  }
}
impl ByteSource for SliceSource<'_> {
  #[inline]
  fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
    let count = buf.len().min(self.spare.len());
    let (head, tail) = self.spare.split_at(count);
    buf[..count].copy_from_slice(head);
    self.spare = tail;
    self.position += count as u64;
    count
  }
  #[inline]
  fn position(&self) -> u64 {
    self.position
  }
}

impl ByteSink for Vec<u8> {
  #[inline]
  fn write_bytes(&mut self, bytes: &[u8]) -> PngResult<()> {
    self.try_reserve(bytes.len())?;
    self.extend_from_slice(bytes);
    Ok(())
  }
}

/// Adapts any [`Read`](std::io::Read) into a [`ByteSource`].
///
/// An I/O error ends the stream at that point, same as reaching end of file.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[derive(Debug)]
pub struct IoSource<R> {
  reader: R,
  position: u64,
}
#[cfg(feature = "std")]
impl<R: std::io::Read> IoSource<R> {
  /// Wraps the reader.
  #[inline]
  #[must_use]
  pub const fn new(reader: R) -> Self {
    Self { reader, position: 0 }
  }

  /// Unwraps the reader.
  #[inline]
  #[must_use]
  pub fn into_inner(self) -> R {
    self.reader
  }
}
#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for IoSource<R> {
  fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
      match self.reader.read(&mut buf[filled..]) {
        Ok(0) => break,
        Ok(n) => filled += n,
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
        Err(e) => {
          log::warn!("read failed at byte {}: {e}", self.position + filled as u64);
          break;
        }
      }
    }
    self.position += filled as u64;
    filled
  }
  #[inline]
  fn position(&self) -> u64 {
    self.position
  }
}

/// Adapts any [`Write`](std::io::Write) into a [`ByteSink`].
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[derive(Debug)]
pub struct IoSink<W> {
  writer: W,
}
#[cfg(feature = "std")]
impl<W: std::io::Write> IoSink<W> {
  /// Wraps the writer.
  #[inline]
  #[must_use]
  pub const fn new(writer: W) -> Self {
    Self { writer }
  }

  /// Unwraps the writer.
  #[inline]
  #[must_use]
  pub fn into_inner(self) -> W {
    self.writer
  }
}
#[cfg(feature = "std")]
impl<W: std::io::Write> ByteSink for IoSink<W> {
  fn write_bytes(&mut self, bytes: &[u8]) -> PngResult<()> {
    self.writer.write_all(bytes).map_err(|e| {
      log::error!("write of {} bytes failed: {e}", bytes.len());
      crate::PngError::WriteFailed
    })
  }
}

#[test]
fn test_slice_source_short_read() {
  let mut src = SliceSource::new(&[1, 2, 3]);
  let mut buf = [0; 2];
  assert_eq!(src.read_bytes(&mut buf), 2);
  assert_eq!(buf, [1, 2]);
  assert_eq!(src.read_bytes(&mut buf), 1);
  assert_eq!(buf[0], 3);
  assert_eq!(src.position(), 3);
  assert_eq!(src.read_bytes(&mut buf), 0);
}
