use super::*;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels stored per pixel in the image data.
  #[inline]
  #[must_use]
  pub const fn stored_channels(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// The color type that stores this many (8-bit) channels directly.
  #[inline]
  #[must_use]
  pub const fn from_channel_count(channels: usize) -> Option<Self> {
    Some(match channels {
      1 => Self::Y,
      2 => Self::YA,
      3 => Self::RGB,
      4 => Self::RGBA,
      _ => return None,
    })
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(PngError::UnsupportedColorType),
    })
  }
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct IhdrFields {
  width: U32BE,
  height: U32BE,
  bit_depth: u8,
  color_type: u8,
  compression_method: u8,
  filter_method: u8,
  interlace_method: u8,
}

/// Image Header
///
/// Getting one of these through `TryFrom` means that the header describes an
/// image this crate is able to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per stored channel (or per index, for indexed color)
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
}
impl IHDR {
  /// Bits used by one pixel of stored (not yet expanded) image data.
  #[inline]
  #[must_use]
  pub const fn stored_bits_per_pixel(&self) -> usize {
    self.color_type.stored_channels() * self.bit_depth as usize
  }

  /// Bytes of the unfiltered data in one row `width` pixels wide.
  ///
  /// Pixels smaller than a byte are packed, and a partial byte at the end of
  /// the row is rounded up.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(&self, width: u32) -> usize {
    (self.stored_bits_per_pixel() * (width as usize) + 7) / 8
  }

  /// The exact number of bytes that decompression of a `width` by `height`
  /// image (or sub-frame) must produce: one filter byte plus a scanline for
  /// each row.
  ///
  /// Returns `None` on overflow.
  #[inline]
  #[must_use]
  pub const fn filtered_len(&self, width: u32, height: u32) -> Option<usize> {
    let bits = match (width as usize).checked_mul(self.stored_bits_per_pixel()) {
      Some(bits) => bits,
      None => return None,
    };
    let line = 1 + bits / 8 + if bits % 8 != 0 { 1 } else { 0 };
    line.checked_mul(height as usize)
  }

  /// The filter step distance in bytes: how far back the "left" byte is.
  ///
  /// Indexed images always use 1.
  #[inline]
  #[must_use]
  pub const fn filter_bpp(&self) -> usize {
    match self.color_type {
      PngColorType::Index => 1,
      other => {
        let bytes = other.stored_channels() * (self.bit_depth as usize / 8);
        if bytes == 0 {
          1
        } else {
          bytes
        }
      }
    }
  }

  /// Bits per channel after decoding: palette entries expand to 8 bits.
  #[inline]
  #[must_use]
  pub const fn output_bit_depth(&self) -> u8 {
    match self.color_type {
      PngColorType::Index => 8,
      _ => self.bit_depth,
    }
  }

  /// Channels per pixel after decoding.
  ///
  /// Indexed images become RGB, or RGBA when the image has transparency.
  #[inline]
  #[must_use]
  pub const fn output_channels(&self, has_transparency: bool) -> usize {
    match self.color_type {
      PngColorType::Index if has_transparency => 4,
      PngColorType::Index => 3,
      other => other.stored_channels(),
    }
  }
}
impl TryFrom<&[u8]> for IHDR {
  type Error = PngError;
  /// Parses and validates the 13 bytes of header data.
  fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
    let f: IhdrFields = pod_from_exact(data).ok_or(PngError::MalformedChunk)?;
    let width = f.width.to_u32();
    let height = f.height.to_u32();
    if width == 0 || height == 0 {
      return Err(PngError::WidthOrHeightZero);
    }
    let color_type = PngColorType::try_from(f.color_type)?;
    let bit_depth_ok = match color_type {
      PngColorType::Index => matches!(f.bit_depth, 1 | 2 | 4 | 8),
      _ => matches!(f.bit_depth, 8 | 16),
    };
    if !bit_depth_ok {
      return Err(PngError::UnsupportedBitDepth);
    }
    if f.compression_method != 0 {
      return Err(PngError::UnsupportedCompressionMethod);
    }
    if f.filter_method != 0 {
      return Err(PngError::UnsupportedFilterMethod);
    }
    if f.interlace_method != 0 {
      return Err(PngError::InterlacingUnsupported);
    }
    Ok(Self { width, height, bit_depth: f.bit_depth, color_type })
  }
}
impl IHDR {
  /// The 13 bytes of chunk data for this header.
  #[inline]
  #[must_use]
  pub fn to_chunk_data(&self) -> [u8; 13] {
    bytemuck::cast(IhdrFields {
      width: U32BE::from_u32(self.width),
      height: U32BE::from_u32(self.height),
      bit_depth: self.bit_depth,
      color_type: self.color_type as u8,
      compression_method: 0,
      filter_method: 0,
      interlace_method: 0,
    })
  }
}

#[test]
fn test_ihdr_sizes() {
  let ihdr = IHDR { width: 3, height: 2, bit_depth: 2, color_type: PngColorType::Index };
  assert_eq!(ihdr.bytes_per_scanline(3), 1);
  assert_eq!(ihdr.filtered_len(3, 2), Some(4));
  assert_eq!(ihdr.filter_bpp(), 1);
  assert_eq!(ihdr.output_channels(false), 3);
  assert_eq!(ihdr.output_channels(true), 4);

  let ihdr = IHDR { width: 5, height: 4, bit_depth: 16, color_type: PngColorType::RGBA };
  assert_eq!(ihdr.filter_bpp(), 8);
  assert_eq!(ihdr.filtered_len(5, 4), Some(4 * (1 + 40)));
  assert_eq!(IHDR::try_from(&ihdr.to_chunk_data()[..]), Ok(ihdr));
}
