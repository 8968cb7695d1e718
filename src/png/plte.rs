use super::*;

/// Palette data
///
/// Palette entries are always RGB.
///
/// If you want to have a paletted image with transparency then the transparency
/// info goes in a separate transparency chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PLTE<'b>(&'b [[u8; 3]]);
impl<'b> TryFrom<&'b [u8]> for PLTE<'b> {
  type Error = PngError;
  /// There must be 1 to 256 entries, with no partial entry.
  #[inline]
  fn try_from(data: &'b [u8]) -> Result<Self, Self::Error> {
    match bytemuck::try_cast_slice::<u8, [u8; 3]>(data) {
      Ok(entries) if (1..=256).contains(&entries.len()) => Ok(Self(entries)),
      _ => Err(PngError::MalformedChunk),
    }
  }
}
impl Debug for PLTE<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // currently prints no more than 4 palette entries
    f.debug_tuple("PLTE").field(&&self.0[..self.0.len().min(4)]).field(&self.0.len()).finish()
  }
}
impl<'b> PLTE<'b> {
  /// Gets the entries as a slice.
  #[inline]
  #[must_use]
  pub const fn entries(&self) -> &'b [[u8; 3]] {
    self.0
  }
}
