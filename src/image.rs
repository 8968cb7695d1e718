#![forbid(unsafe_code)]

//! The image sink that decoded pixels are written into.
//!
//! The codec doesn't care what your image type looks like, as long as it can
//! hand out its channel-interleaved bytes. Implement [`PixelBuffer`] for your
//! type and [`ImageFactory`] for whatever builds it, or just use the provided
//! [`Image`] and [`DefaultImageFactory`].

use alloc::vec::Vec;

use crate::{PngError, PngResult};

/// Converts a `(frame, x, y, channel)` position into a linear byte index.
///
/// Pixel data is row-major and channel-interleaved, each channel being
/// `bytes_per_channel` bytes, and frames are stored one whole canvas after
/// another. All image containers in this crate use this function, so if you
/// want to do the exact same index math yourself you can.
#[inline]
#[must_use]
pub const fn pixel_byte_index(
  frame: usize, x: u32, y: u32, channel: usize, width: u32, height: u32, channels: usize,
  bytes_per_channel: usize,
) -> usize {
  let pixel_stride = channels * bytes_per_channel;
  let row_stride = width as usize * pixel_stride;
  let frame_stride = height as usize * row_stride;
  frame * frame_stride
    + y as usize * row_stride
    + x as usize * pixel_stride
    + channel * bytes_per_channel
}

/// The interface the codec uses to fill (or read) an image.
pub trait PixelBuffer {
  /// Canvas width in pixels.
  fn width(&self) -> u32;
  /// Canvas height in pixels.
  fn height(&self) -> u32;
  /// Channels per pixel.
  fn channels(&self) -> usize;
  /// Bits per channel, either 8 or 16.
  fn bit_depth(&self) -> u8;
  /// How many full canvases are stored.
  fn frame_count(&self) -> usize;
  /// All the pixel bytes of all frames.
  fn as_bytes(&self) -> &[u8];
  /// All the pixel bytes of all frames, mutably.
  fn as_bytes_mut(&mut self) -> &mut [u8];

  /// Bytes used for each channel of a pixel.
  #[inline]
  fn bytes_per_channel(&self) -> usize {
    usize::from(self.bit_depth() / 8)
  }

  /// Bytes in a single row of a single frame.
  #[inline]
  fn row_stride(&self) -> usize {
    self.width() as usize * self.channels() * self.bytes_per_channel()
  }

  /// The bytes of one whole frame.
  #[inline]
  fn frame_bytes_mut(&mut self, frame: usize) -> Option<&mut [u8]> {
    let frame_len = self.row_stride() * self.height() as usize;
    let start = frame.checked_mul(frame_len)?;
    self.as_bytes_mut().get_mut(start..start.checked_add(frame_len)?)
  }
}

/// Makes images for the decoder to fill.
pub trait ImageFactory {
  /// The image type produced.
  type Image: PixelBuffer;

  /// Allocates an image with all bytes zeroed.
  fn create(
    &mut self, width: u32, height: u32, channels: usize, bit_depth: u8, frame_count: usize,
  ) -> PngResult<Self::Image>;
}

/// An owned image, possibly holding several animation frames.
///
/// The fields are public, but if you put them together weirdly the methods of
/// this type will return `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Image {
  pub width: u32,
  pub height: u32,
  pub channels: usize,
  pub bit_depth: u8,
  pub frame_count: usize,
  pub pixels: Vec<u8>,
}
impl Image {
  /// Makes an all-zero image.
  ///
  /// ## Failure
  /// * `bit_depth` must be 8 or 16.
  /// * `channels` must be `1..=4`.
  /// * The byte size must fit in `usize` and be allocatable.
  pub fn try_new(
    width: u32, height: u32, channels: usize, bit_depth: u8, frame_count: usize,
  ) -> PngResult<Self> {
    if bit_depth != 8 && bit_depth != 16 {
      return Err(PngError::UnsupportedBitDepth);
    }
    if !(1..=4).contains(&channels) {
      return Err(PngError::UnsupportedChannelCount);
    }
    let byte_len = (width as usize)
      .checked_mul(height as usize)
      .and_then(|px| px.checked_mul(channels * usize::from(bit_depth / 8)))
      .and_then(|b| b.checked_mul(frame_count))
      .ok_or(PngError::DimensionsTooLarge)?;
    let mut pixels: Vec<u8> = Vec::new();
    pixels.try_reserve_exact(byte_len)?;
    pixels.resize(byte_len, 0);
    Ok(Self { width, height, channels, bit_depth, frame_count, pixels })
  }

  /// Makes a single frame, 8 bits per channel image from existing bytes.
  ///
  /// Returns `None` if the byte count doesn't match.
  #[must_use]
  pub fn from_u8_pixels(width: u32, height: u32, channels: usize, pixels: Vec<u8>) -> Option<Self> {
    let expected = (width as usize).checked_mul(height as usize)?.checked_mul(channels)?;
    if pixels.len() == expected {
      Some(Self { width, height, channels, bit_depth: 8, frame_count: 1, pixels })
    } else {
      None
    }
  }

  #[inline]
  fn index_of(&self, frame: usize, x: u32, y: u32, channel: usize) -> Option<usize> {
    if frame < self.frame_count && x < self.width && y < self.height && channel < self.channels {
      Some(pixel_byte_index(
        frame,
        x,
        y,
        channel,
        self.width,
        self.height,
        self.channels,
        self.bytes_per_channel(),
      ))
    } else {
      None
    }
  }

  /// Gets the bytes of one pixel, or `None` if the position is out of bounds.
  #[inline]
  #[must_use]
  pub fn pixel(&self, frame: usize, x: u32, y: u32) -> Option<&[u8]> {
    let start = self.index_of(frame, x, y, 0)?;
    self.pixels.get(start..start + self.channels * self.bytes_per_channel())
  }

  /// Mutable version of [`pixel`](Self::pixel).
  #[inline]
  #[must_use]
  pub fn pixel_mut(&mut self, frame: usize, x: u32, y: u32) -> Option<&mut [u8]> {
    let start = self.index_of(frame, x, y, 0)?;
    let len = self.channels * self.bytes_per_channel();
    self.pixels.get_mut(start..start + len)
  }

  /// Gets one channel value of the first frame.
  ///
  /// 16-bit channels are read as big-endian.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32, channel: usize) -> Option<u16> {
    let i = self.index_of(0, x, y, channel)?;
    match self.bit_depth {
      16 => Some(u16::from_be_bytes([*self.pixels.get(i)?, *self.pixels.get(i + 1)?])),
      _ => self.pixels.get(i).map(|&b| u16::from(b)),
    }
  }

  /// Sets one channel value of the first frame.
  ///
  /// The value is truncated to 8 bits for 8-bit images. Returns `false` if the
  /// position was out of bounds.
  #[inline]
  pub fn set(&mut self, x: u32, y: u32, channel: usize, value: u16) -> bool {
    let Some(i) = self.index_of(0, x, y, channel) else { return false };
    match self.bit_depth {
      16 => match self.pixels.get_mut(i..i + 2) {
        Some(dst) => dst.copy_from_slice(&value.to_be_bytes()),
        None => return false,
      },
      _ => match self.pixels.get_mut(i) {
        Some(dst) => *dst = value as u8,
        None => return false,
      },
    }
    true
  }

  /// Converts the given frame into RGBA8 pixels.
  ///
  /// * 1 channel is greyscale, 2 is greyscale + alpha.
  /// * Missing alpha becomes fully opaque.
  /// * 16-bit channels keep their high byte.
  pub fn to_rgba8(&self, frame: usize) -> PngResult<Vec<[u8; 4]>> {
    let pixel_count = (self.width as usize) * (self.height as usize);
    let mut out: Vec<[u8; 4]> = Vec::new();
    out.try_reserve_exact(pixel_count)?;
    let pixel_len = self.channels * self.bytes_per_channel();
    let frame_len = pixel_count * pixel_len;
    let start = frame.checked_mul(frame_len).ok_or(PngError::SizeMismatch)?;
    let frame_bytes =
      self.pixels.get(start..start + frame_len).ok_or(PngError::SizeMismatch)?;
    let step = self.bytes_per_channel();
    out.extend(frame_bytes.chunks_exact(pixel_len).map(|px| {
      let c = |n: usize| px[n * step];
      match self.channels {
        1 => [c(0), c(0), c(0), 255],
        2 => [c(0), c(0), c(0), c(1)],
        3 => [c(0), c(1), c(2), 255],
        _ => [c(0), c(1), c(2), c(3)],
      }
    }));
    Ok(out)
  }
}
impl PixelBuffer for Image {
  #[inline]
  fn width(&self) -> u32 {
    self.width
  }
  #[inline]
  fn height(&self) -> u32 {
    self.height
  }
  #[inline]
  fn channels(&self) -> usize {
    self.channels
  }
  #[inline]
  fn bit_depth(&self) -> u8 {
    self.bit_depth
  }
  #[inline]
  fn frame_count(&self) -> usize {
    self.frame_count
  }
  #[inline]
  fn as_bytes(&self) -> &[u8] {
    &self.pixels
  }
  #[inline]
  fn as_bytes_mut(&mut self) -> &mut [u8] {
    &mut self.pixels
  }
}

/// Builds plain [`Image`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DefaultImageFactory;
impl ImageFactory for DefaultImageFactory {
  type Image = Image;
  #[inline]
  fn create(
    &mut self, width: u32, height: u32, channels: usize, bit_depth: u8, frame_count: usize,
  ) -> PngResult<Image> {
    Image::try_new(width, height, channels, bit_depth, frame_count)
  }
}

#[test]
fn test_pixel_byte_index_strides() {
  // 3x2 RGB, 16-bit, second frame
  assert_eq!(pixel_byte_index(0, 0, 0, 0, 3, 2, 3, 2), 0);
  assert_eq!(pixel_byte_index(0, 1, 0, 2, 3, 2, 3, 2), 6 + 4);
  assert_eq!(pixel_byte_index(0, 0, 1, 0, 3, 2, 3, 2), 18);
  assert_eq!(pixel_byte_index(1, 0, 0, 0, 3, 2, 3, 2), 36);
}

#[test]
fn test_image_get_set_and_rgba8() {
  let mut img = Image::try_new(2, 1, 2, 8, 1).unwrap();
  assert!(img.set(1, 0, 0, 200));
  assert!(img.set(1, 0, 1, 100));
  assert!(!img.set(2, 0, 0, 1));
  assert_eq!(img.get(1, 0, 0), Some(200));
  assert_eq!(img.pixel(0, 1, 0), Some(&[200, 100][..]));
  assert_eq!(img.to_rgba8(0).unwrap(), [[0, 0, 0, 0], [200, 200, 200, 100]]);

  let mut wide = Image::try_new(1, 1, 1, 16, 1).unwrap();
  wide.set(0, 0, 0, 0x1234);
  assert_eq!(wide.pixels, [0x12, 0x34]);
  assert_eq!(wide.get(0, 0, 0), Some(0x1234));
  assert_eq!(wide.to_rgba8(0).unwrap(), [[0x12, 0x12, 0x12, 255]]);
}

#[test]
fn test_pixel_mut_second_frame() {
  let mut img = Image::try_new(2, 2, 3, 8, 2).unwrap();
  img.pixel_mut(1, 1, 1).unwrap().copy_from_slice(&[7, 8, 9]);
  assert!(img.pixel_mut(2, 0, 0).is_none());
  assert!(img.pixel_mut(0, 2, 0).is_none());
  assert_eq!(img.pixel(1, 1, 1), Some(&[7, 8, 9][..]));
  assert_eq!(img.pixel(0, 1, 1), Some(&[0, 0, 0][..]));
  assert_eq!(&img.pixels[12 + 9..], [7, 8, 9]);
}
