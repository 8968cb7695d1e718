use super::*;

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct FctlFields {
  sequence_number: U32BE,
  width: U32BE,
  height: U32BE,
  x_offset: U32BE,
  y_offset: U32BE,
  delay_num: U16BE,
  delay_den: U16BE,
  dispose_op: u8,
  blend_op: u8,
}

/// What happens to the frame's area of the canvas after the frame is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum DisposeOp {
  /// Leave the canvas as is.
  #[default]
  None = 0,
  /// Clear the region to transparent black.
  Background = 1,
  /// Restore the region to what it was before this frame.
  Previous = 2,
}

/// How the frame is combined with the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum BlendOp {
  /// Overwrite the region, alpha included.
  #[default]
  Source = 0,
  /// Alpha-composite over the region.
  Over = 1,
}

/// Frame Control
///
/// Describes one animation frame: where it goes on the canvas and how long it
/// stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style, missing_docs)]
pub struct fcTL {
  pub sequence_number: u32,
  pub width: u32,
  pub height: u32,
  pub x_offset: u32,
  pub y_offset: u32,
  pub delay_num: u16,
  pub delay_den: u16,
  pub dispose_op: DisposeOp,
  pub blend_op: BlendOp,
}
impl TryFrom<&[u8]> for fcTL {
  type Error = PngError;
  #[inline]
  fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
    let f: FctlFields = pod_from_exact(data).ok_or(PngError::MalformedChunk)?;
    let dispose_op = match f.dispose_op {
      0 => DisposeOp::None,
      1 => DisposeOp::Background,
      2 => DisposeOp::Previous,
      _ => return Err(PngError::MalformedChunk),
    };
    let blend_op = match f.blend_op {
      0 => BlendOp::Source,
      1 => BlendOp::Over,
      _ => return Err(PngError::MalformedChunk),
    };
    Ok(Self {
      sequence_number: f.sequence_number.to_u32(),
      width: f.width.to_u32(),
      height: f.height.to_u32(),
      x_offset: f.x_offset.to_u32(),
      y_offset: f.y_offset.to_u32(),
      delay_num: f.delay_num.to_u16(),
      delay_den: f.delay_den.to_u16(),
      dispose_op,
      blend_op,
    })
  }
}
impl fcTL {
  /// The frame delay in milliseconds.
  ///
  /// A denominator of 0 means hundredths of a second.
  #[inline]
  #[must_use]
  pub const fn delay_millis(&self) -> u32 {
    let den = if self.delay_den == 0 { 100 } else { self.delay_den as u32 };
    (self.delay_num as u32 * 1000) / den
  }

  /// Checks that the frame is non-empty and fits entirely in the canvas.
  #[inline]
  pub fn check_bounds(&self, canvas_width: u32, canvas_height: u32) -> PngResult<()> {
    let fits = |offset: u32, len: u32, canvas: u32| {
      len > 0 && offset.checked_add(len).map_or(false, |end| end <= canvas)
    };
    if fits(self.x_offset, self.width, canvas_width)
      && fits(self.y_offset, self.height, canvas_height)
    {
      Ok(())
    } else {
      Err(PngError::FrameOutOfBounds)
    }
  }
}

#[test]
fn test_fctl_parse() {
  let mut data = [0_u8; 26];
  data[3] = 7; // sequence
  data[7] = 4; // width
  data[11] = 2; // height
  data[15] = 1; // x
  data[21] = 3; // delay num
  data[23] = 0; // delay den
  data[24] = 1;
  data[25] = 1;
  let f = fcTL::try_from(&data[..]).unwrap();
  assert_eq!(f.sequence_number, 7);
  assert_eq!((f.width, f.height, f.x_offset, f.y_offset), (4, 2, 1, 0));
  assert_eq!(f.delay_millis(), 30);
  assert_eq!(f.dispose_op, DisposeOp::Background);
  assert_eq!(f.blend_op, BlendOp::Over);
  assert!(f.check_bounds(5, 2).is_ok());
  assert_eq!(f.check_bounds(4, 2), Err(PngError::FrameOutOfBounds));

  data[24] = 3;
  assert_eq!(fcTL::try_from(&data[..]), Err(PngError::MalformedChunk));
  assert_eq!(fcTL::try_from(&data[..25]), Err(PngError::MalformedChunk));
}
