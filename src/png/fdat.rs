use super::*;

/// Frame Data
///
/// The same as `IDAT` data, but for an animation frame after the first, and
/// with a sequence number in front.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style)]
pub struct fdAT<'b> {
  /// Position in the shared `fcTL` / `fdAT` sequence.
  pub sequence_number: u32,
  /// Zlib data, a piece of the frame's datastream.
  pub data: &'b [u8],
}
impl<'b> TryFrom<&'b [u8]> for fdAT<'b> {
  type Error = PngError;
  #[inline]
  fn try_from(data: &'b [u8]) -> Result<Self, Self::Error> {
    if data.len() < 4 {
      return Err(PngError::MalformedChunk);
    }
    let (seq, data) = data.split_at(4);
    let sequence_number = u32::from_be_bytes([seq[0], seq[1], seq[2], seq[3]]);
    Ok(Self { sequence_number, data })
  }
}
impl Debug for fdAT<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("fdAT")
      .field("sequence_number", &self.sequence_number)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .finish()
  }
}
