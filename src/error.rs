/// An error from decoding or encoding PNG data.
///
/// Every failure is fatal to the decode or encode in progress. There's no
/// "partial image" result, and any buffers allocated for the attempt are
/// dropped before the error reaches you.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PngError {
  /// The first eight bytes are not the PNG signature.
  BadSignature,

  /// A chunk was cut short, had an illegal length for its type, or appeared
  /// somewhere it can't legally be. A stream that runs out before `IEND` also
  /// gives this error.
  MalformedChunk,

  /// The CRC stored after a chunk doesn't match the chunk's type and data.
  CrcMismatch,

  /// The bit depth isn't allowed for the color type, or (when encoding) isn't
  /// 8.
  UnsupportedBitDepth,

  /// The header's compression method isn't 0.
  UnsupportedCompressionMethod,

  /// The header's filter method isn't 0.
  UnsupportedFilterMethod,

  /// The header declares Adam7 interlacing (or an unknown interlace method).
  InterlacingUnsupported,

  /// The header's color type isn't one of 0, 2, 3, 4, or 6.
  UnsupportedColorType,

  /// An indexed color image reached its image data without any `PLTE` chunk.
  MissingPalette,

  /// A scanline of an indexed color image used a filter other than None.
  UnsupportedFilterForIndexedImage,

  /// The decompressed data isn't the size that the frame dimensions require.
  SizeMismatch,

  /// The zlib stream of the image data was corrupt.
  DecompressionFailed,

  /// A scanline began with a filter type outside of `0..=4`.
  UnknownFilterType,

  /// The declared width and/or height is 0.
  WidthOrHeightZero,

  /// The image is larger than the decoder configuration allows.
  ///
  /// The default limit is 16,384 in each dimension, which prevents accidental
  /// out-of-memory problems from hostile headers.
  DimensionsTooLarge,

  /// An animation frame's rectangle doesn't fit within the canvas.
  FrameOutOfBounds,

  /// The encoder was given an image with a channel count outside of `1..=4`.
  UnsupportedChannelCount,

  /// The compressor rejected its input or parameters.
  CompressionFailed,

  /// The output byte sink refused a write.
  WriteFailed,

  /// The allocator couldn't give us enough space.
  Alloc,
}

/// Result type for all the PNG operations.
pub type PngResult<T> = Result<T, PngError>;

impl core::fmt::Display for PngError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let msg = match self {
      Self::BadSignature => "the data does not begin with the PNG signature",
      Self::MalformedChunk => "a chunk was truncated or malformed",
      Self::CrcMismatch => "a chunk's stored CRC does not match its contents",
      Self::UnsupportedBitDepth => "the bit depth is not supported for this color type",
      Self::UnsupportedCompressionMethod => "the compression method must be 0",
      Self::UnsupportedFilterMethod => "the filter method must be 0",
      Self::InterlacingUnsupported => "interlaced images are not supported",
      Self::UnsupportedColorType => "the color type is not a legal PNG color type",
      Self::MissingPalette => "an indexed color image has no palette",
      Self::UnsupportedFilterForIndexedImage => {
        "an indexed color scanline uses a filter other than None"
      }
      Self::SizeMismatch => "the decompressed data does not match the image dimensions",
      Self::DecompressionFailed => "the compressed image data is corrupt",
      Self::UnknownFilterType => "a scanline uses an unknown filter type",
      Self::WidthOrHeightZero => "the image width or height is zero",
      Self::DimensionsTooLarge => "the image dimensions exceed the configured limit",
      Self::FrameOutOfBounds => "an animation frame lies outside of the canvas",
      Self::UnsupportedChannelCount => "only 1 to 4 channels can be encoded",
      Self::CompressionFailed => "the compressor failed",
      Self::WriteFailed => "the output sink failed to accept data",
      Self::Alloc => "memory allocation failed",
    };
    f.write_str(msg)
  }
}

#[cfg(feature = "std")]
impl std::error::Error for PngError {}

impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
