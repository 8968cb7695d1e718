use super::*;

use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{
      TINFL_FLAG_HAS_MORE_INPUT, TINFL_FLAG_PARSE_ZLIB_HEADER,
      TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF,
    },
    DecompressorOxide,
  },
  TINFLStatus,
};

/// Output arenas never start smaller than this.
const MIN_ARENA: usize = 1024;

/// One zlib datastream being inflated as its pieces arrive.
///
/// The main image is one session, fed by every `IDAT`, and each later
/// animation frame is a separate session, fed by its `fdAT` chunks.
///
/// Output goes into a single growable arena. Whenever the arena fills up it's
/// doubled, and decompression continues in the new upper half. The data
/// already written stays in place, since back references can point into it.
pub struct ZlibSession {
  decompressor: Option<Box<DecompressorOxide>>,
  arena: Vec<u8>,
  initial_len: usize,
  produced: usize,
  limit: usize,
  ended: bool,
}
impl Debug for ZlibSession {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ZlibSession")
      .field("started", &self.decompressor.is_some())
      .field("arena_len", &self.arena.len())
      .field("produced", &self.produced)
      .field("limit", &self.limit)
      .field("ended", &self.ended)
      .finish()
  }
}
impl ZlibSession {
  /// Makes a session expecting `expected_len` bytes of output.
  ///
  /// * The arena starts at `initial_len` bytes (but at least 1k).
  /// * Growth stops once the arena would exceed twice the expected length,
  ///   giving `SizeMismatch`.
  ///
  /// Nothing is allocated until the first `feed`.
  #[inline]
  #[must_use]
  pub const fn new(initial_len: usize, expected_len: usize) -> Self {
    Self {
      decompressor: None,
      arena: Vec::new(),
      initial_len,
      produced: 0,
      limit: expected_len,
      ended: false,
    }
  }

  /// If the zlib stream has reached its end.
  #[inline]
  #[must_use]
  pub const fn has_ended(&self) -> bool {
    self.ended
  }

  /// Takes the decompressed bytes, ending the session.
  #[inline]
  #[must_use]
  pub fn into_output(mut self) -> Vec<u8> {
    self.arena.truncate(self.produced);
    self.arena
  }

  fn grow_arena(arena: &mut Vec<u8>, limit: usize) -> PngResult<()> {
    let old_len = arena.len();
    if old_len > limit {
      log::error!("zlib stream is larger than the expected {limit} bytes");
      return Err(PngError::SizeMismatch);
    }
    let new_len = old_len.saturating_mul(2).max(MIN_ARENA);
    arena.try_reserve_exact(new_len - old_len)?;
    arena.resize(new_len, 0);
    Ok(())
  }

  /// Feeds one chunk's worth of zlib data.
  ///
  /// Returns if the stream has ended. Feeding a session that has already
  /// ended does nothing.
  ///
  /// ## Failure
  /// * Corrupt zlib data (including a bad Adler-32) is `DecompressionFailed`.
  /// * Output beyond twice the expected length is `SizeMismatch`.
  pub fn feed(&mut self, mut input: &[u8]) -> PngResult<bool> {
    if self.ended {
      if !input.is_empty() {
        log::warn!("ignoring {} bytes after the end of the zlib stream", input.len());
      }
      return Ok(true);
    }
    let r = match &mut self.decompressor {
      Some(r) => r,
      none => {
        let initial = self.initial_len.max(MIN_ARENA);
        self.arena.try_reserve_exact(initial)?;
        self.arena.resize(initial, 0);
        log::trace!("zlib session started, {initial} byte arena");
        none.insert(Box::default())
      }
    };
    let flags = TINFL_FLAG_PARSE_ZLIB_HEADER
      | TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF
      | TINFL_FLAG_HAS_MORE_INPUT;
    loop {
      if self.produced == self.arena.len() {
        Self::grow_arena(&mut self.arena, self.limit)?;
      }
      let (status, bytes_read, bytes_written) =
        decompress(r, input, &mut self.arena, self.produced, flags);
      input = &input[bytes_read..];
      self.produced += bytes_written;
      match status {
        TINFLStatus::Done => {
          self.ended = true;
          if !input.is_empty() {
            log::warn!("ignoring {} bytes after the end of the zlib stream", input.len());
          }
          log::trace!("zlib session ended, {} bytes", self.produced);
          return Ok(true);
        }
        TINFLStatus::HasMoreOutput => {
          let old_len = self.arena.len();
          Self::grow_arena(&mut self.arena, self.limit)?;
          log::trace!("zlib arena grew {old_len} -> {}", self.arena.len());
        }
        TINFLStatus::NeedsMoreInput => return Ok(false),
        TINFLStatus::FailedCannotMakeProgress
        | TINFLStatus::BadParam
        | TINFLStatus::Adler32Mismatch
        | TINFLStatus::Failed => {
          log::error!("zlib data is corrupt: {status:?}");
          return Err(PngError::DecompressionFailed);
        }
      }
    }
  }
}

#[test]
fn test_zlib_session_split_input_and_growth() {
  let original: Vec<u8> = (0..5000_u32).map(|i| (i * 7 % 251) as u8).collect();
  let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&original, 6);
  let mut session = ZlibSession::new(16, original.len());
  let (a, b) = compressed.split_at(compressed.len() / 2);
  assert_eq!(session.feed(a), Ok(false));
  assert_eq!(session.feed(&[]), Ok(false));
  assert_eq!(session.feed(b), Ok(true));
  assert!(session.has_ended());
  assert_eq!(session.feed(b"junk"), Ok(true));
  assert_eq!(session.into_output(), original);
}

#[test]
fn test_zlib_session_rejects_garbage() {
  let mut session = ZlibSession::new(16, 100);
  assert_eq!(session.feed(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF]), Err(PngError::DecompressionFailed));
}

#[test]
fn test_zlib_session_enforces_limit() {
  let original = [0_u8; 100_000];
  let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&original, 6);
  let mut session = ZlibSession::new(0, 10);
  assert_eq!(session.feed(&compressed), Err(PngError::SizeMismatch));
}
