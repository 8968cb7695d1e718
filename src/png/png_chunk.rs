use super::*;

/// A parsed PNG chunk, borrowing from a [`RawPngChunk`].
///
/// Chunk types this crate doesn't act on come out as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style)]
pub enum PngChunk<'b> {
  /// Image Header
  IHDR(IHDR),
  /// Palette
  PLTE(PLTE<'b>),
  /// Transparency
  tRNS(tRNS<'b>),
  /// Image Data
  IDAT(&'b [u8]),
  /// Image End
  IEND,
  /// Animation Control
  acTL(acTL),
  /// Frame Control
  fcTL(fcTL),
  /// Frame Data
  fdAT(fdAT<'b>),
  /// Anything else
  Unknown(PngChunkTy),
}
impl<'b> TryFrom<&'b RawPngChunk> for PngChunk<'b> {
  type Error = PngError;
  #[inline]
  fn try_from(raw: &'b RawPngChunk) -> Result<Self, Self::Error> {
    let data: &'b [u8] = &raw.data;
    Ok(match raw.chunk_ty {
      PngChunkTy::IHDR => PngChunk::IHDR(IHDR::try_from(data)?),
      PngChunkTy::PLTE => PngChunk::PLTE(PLTE::try_from(data)?),
      PngChunkTy::tRNS => PngChunk::tRNS(tRNS::from(data)),
      PngChunkTy::IDAT => PngChunk::IDAT(data),
      PngChunkTy::IEND => PngChunk::IEND,
      PngChunkTy::acTL => PngChunk::acTL(acTL::try_from(data)?),
      PngChunkTy::fcTL => PngChunk::fcTL(fcTL::try_from(data)?),
      PngChunkTy::fdAT => PngChunk::fdAT(fdAT::try_from(data)?),
      other => PngChunk::Unknown(other),
    })
  }
}
