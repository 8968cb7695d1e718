use super::*;

/// Transparency
///
/// For indexed images this is one alpha byte per palette entry. There can be
/// fewer alpha entries than palette entries.
///
/// Greyscale and RGB images store a single "transparent color" key instead.
/// That form is skipped by the decoder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style)]
pub struct tRNS<'b>(&'b [u8]);
impl<'b> From<&'b [u8]> for tRNS<'b> {
  #[inline]
  fn from(data: &'b [u8]) -> Self {
    Self(data)
  }
}
impl Debug for tRNS<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("tRNS").field(&&self.0[..self.0.len().min(8)]).field(&self.0.len()).finish()
  }
}
impl<'b> tRNS<'b> {
  /// Alpha values to pair with palette entries.
  #[inline]
  #[must_use]
  pub const fn to_alphas(&self) -> &'b [u8] {
    self.0
  }
}
