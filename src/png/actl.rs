use super::*;

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct ActlFields {
  num_frames: U32BE,
  num_plays: U32BE,
}

/// Animation Control
///
/// Marks the image as an APNG. It must appear before the first `IDAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style)]
pub struct acTL {
  /// Number of frames in the animation.
  ///
  /// This counts the frames that have an `fcTL`, which might or might not
  /// include the default image.
  pub num_frames: u32,
  /// Times to play the animation, 0 means loop forever.
  pub num_plays: u32,
}
impl TryFrom<&[u8]> for acTL {
  type Error = PngError;
  #[inline]
  fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
    let f: ActlFields = pod_from_exact(data).ok_or(PngError::MalformedChunk)?;
    let num_frames = f.num_frames.to_u32();
    if num_frames == 0 {
      return Err(PngError::MalformedChunk);
    }
    Ok(Self { num_frames, num_plays: f.num_plays.to_u32() })
  }
}
