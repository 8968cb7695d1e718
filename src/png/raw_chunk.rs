use super::*;

/// A chunk type tag, such as `IHDR`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkTy(pub [u8; 4]);
#[allow(nonstandard_style)]
impl PngChunkTy {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const acTL: Self = Self(*b"acTL");
  pub const fcTL: Self = Self(*b"fcTL");
  pub const fdAT: Self = Self(*b"fdAT");
}
impl Debug for PngChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}

/// An unparsed chunk, already CRC checked.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawPngChunk {
  pub chunk_ty: PngChunkTy,
  pub data: Vec<u8>,
  pub declared_crc: u32,
}
impl Debug for RawPngChunk {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawPngChunk")
      .field("chunk_ty", &self.chunk_ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

/// Chunks larger than this are illegal in PNG.
const MAX_CHUNK_LEN: u32 = (1 << 31) - 1;

/// Chunk data is pulled in pieces of this size, so that a bogus length can't
/// make us allocate a huge buffer for a short stream.
const READ_STEP: usize = 32 * 1024;

/// Reads successive chunks out of a byte source.
///
/// The source should already be positioned just past the PNG signature (see
/// [`read_signature`]).
///
/// As an iterator this produces `Ok` chunks until either the `IEND` chunk has
/// been produced or the source runs out exactly on a chunk boundary. A short
/// read partway through a chunk produces `Err(MalformedChunk)`, and a bad CRC
/// produces `Err(CrcMismatch)`. After any error the iterator is finished.
#[derive(Debug, Clone)]
pub struct RawChunkReader<S> {
  source: S,
  finished: bool,
}
impl<S: ByteSource> RawChunkReader<S> {
  /// Wraps the byte source.
  #[inline]
  #[must_use]
  pub const fn new(source: S) -> Self {
    Self { source, finished: false }
  }

  /// If no further chunks will be produced.
  #[inline]
  #[must_use]
  pub const fn is_finished(&self) -> bool {
    self.finished
  }

  /// Bytes of the source consumed so far.
  #[inline]
  #[must_use]
  pub fn position(&self) -> u64 {
    self.source.position()
  }

  /// Unwraps the byte source.
  #[inline]
  #[must_use]
  pub fn into_inner(self) -> S {
    self.source
  }

  fn read_array<const N: usize>(&mut self) -> PngResult<[u8; N]> {
    let mut a = [0_u8; N];
    if self.source.read_bytes(&mut a) == N {
      Ok(a)
    } else {
      Err(PngError::MalformedChunk)
    }
  }

  fn read_data(&mut self, len: usize) -> PngResult<Vec<u8>> {
    let mut data: Vec<u8> = Vec::new();
    data.try_reserve_exact(len.min(READ_STEP))?;
    while data.len() < len {
      let old_len = data.len();
      let step = (len - old_len).min(READ_STEP);
      data.try_reserve(step)?;
      data.resize(old_len + step, 0);
      if self.source.read_bytes(&mut data[old_len..]) != step {
        return Err(PngError::MalformedChunk);
      }
    }
    Ok(data)
  }

  /// Reads the next chunk.
  ///
  /// * `Ok(None)` when the stream has ended on a chunk boundary, or `IEND`
  ///   was already read.
  /// * The chunk's CRC is always verified.
  pub fn next_chunk(&mut self) -> PngResult<Option<RawPngChunk>> {
    if self.finished {
      return Ok(None);
    }
    let out = self.read_chunk_inner();
    match &out {
      Ok(Some(chunk)) if chunk.chunk_ty == PngChunkTy::IEND => self.finished = true,
      Ok(Some(_)) => (),
      Ok(None) | Err(_) => self.finished = true,
    }
    out
  }

  fn read_chunk_inner(&mut self) -> PngResult<Option<RawPngChunk>> {
    let start = self.source.position();
    let mut len_bytes = [0_u8; 4];
    match self.source.read_bytes(&mut len_bytes) {
      0 => return Ok(None),
      4 => (),
      _ => return Err(PngError::MalformedChunk),
    }
    let declared_len = u32::from_be_bytes(len_bytes);
    if declared_len > MAX_CHUNK_LEN {
      return Err(PngError::MalformedChunk);
    }
    let chunk_ty = PngChunkTy(self.read_array::<4>()?);
    let data = self.read_data(declared_len as usize)?;
    let declared_crc = u32::from_be_bytes(self.read_array::<4>()?);
    let actual_crc = chunk_crc(chunk_ty.0, &data);
    if actual_crc != declared_crc {
      log::trace!(
        "{chunk_ty:?} at byte {start}: declared CRC {declared_crc:08X}, actual {actual_crc:08X}"
      );
      return Err(PngError::CrcMismatch);
    }
    log::trace!("{chunk_ty:?} at byte {start}, {declared_len} bytes");
    Ok(Some(RawPngChunk { chunk_ty, data, declared_crc }))
  }
}
impl<S: ByteSource> Iterator for RawChunkReader<S> {
  type Item = PngResult<RawPngChunk>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    self.next_chunk().transpose()
  }
}
impl<S: ByteSource> core::iter::FusedIterator for RawChunkReader<S> {}

/// Consumes the 8 byte PNG signature from the source.
pub fn read_signature<S: ByteSource>(source: &mut S) -> PngResult<()> {
  let mut sig = [0_u8; 8];
  if source.read_bytes(&mut sig) == 8 && sig == PNG_SIGNATURE {
    Ok(())
  } else {
    Err(PngError::BadSignature)
  }
}

/// Writes a complete chunk: length, type, data, and the freshly computed CRC.
pub fn write_chunk<K: ByteSink + ?Sized>(
  sink: &mut K, chunk_ty: PngChunkTy, data: &[u8],
) -> PngResult<()> {
  let len = u32::try_from(data.len()).ok().filter(|&l| l <= MAX_CHUNK_LEN);
  let len = len.ok_or(PngError::MalformedChunk)?;
  sink.write_bytes(&len.to_be_bytes())?;
  sink.write_bytes(&chunk_ty.0)?;
  sink.write_bytes(data)?;
  sink.write_bytes(&chunk_crc(chunk_ty.0, data).to_be_bytes())?;
  log::trace!("wrote {chunk_ty:?}, {len} bytes");
  Ok(())
}
