use super::*;

use miniz_oxide::deflate::core::{
  compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
};

/// Options for [`encode_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncoderConfig {
  /// Zlib compression level, 0 (none) through 10 (slowest).
  pub compression_level: u8,
  /// Size of the compressor's output buffer. Each `IDAT` chunk holds at most
  /// this many bytes.
  pub idat_buffer_len: usize,
}
impl Default for EncoderConfig {
  #[inline]
  fn default() -> Self {
    Self { compression_level: 6, idat_buffer_len: 32 * 1024 }
  }
}

/// Encodes the first frame of an 8-bit image as a PNG.
///
/// * 1, 2, 3, and 4 channels are written as greyscale, greyscale + alpha, RGB,
///   and RGBA.
/// * Rows are not filtered (they all use filter type `None`).
/// * The chunks written are `IHDR`, one or more `IDAT`, and `IEND`.
///
/// ## Failure
/// * `UnsupportedBitDepth` if the image isn't 8-bit.
/// * `UnsupportedChannelCount` for any other channel count.
/// * `WidthOrHeightZero` for an empty image.
/// * `SizeMismatch` if the image has fewer bytes than its dimensions need.
/// * Any error from the sink.
pub fn encode_png<I, K>(image: &I, sink: &mut K, config: &EncoderConfig) -> PngResult<()>
where
  I: PixelBuffer + ?Sized,
  K: ByteSink + ?Sized,
{
  if image.bit_depth() != 8 {
    return Err(PngError::UnsupportedBitDepth);
  }
  let color_type =
    PngColorType::from_channel_count(image.channels()).ok_or(PngError::UnsupportedChannelCount)?;
  let (width, height) = (image.width(), image.height());
  if width == 0 || height == 0 {
    return Err(PngError::WidthOrHeightZero);
  }
  let row_len = image.row_stride();
  let pixels = image.as_bytes();
  let frame_len = row_len.checked_mul(height as usize).ok_or(PngError::DimensionsTooLarge)?;
  let pixels = pixels.get(..frame_len).ok_or(PngError::SizeMismatch)?;
  if image.frame_count() > 1 {
    log::debug!("only the first of {} frames is encoded", image.frame_count());
  }

  let header = IHDR { width, height, bit_depth: 8, color_type };
  log::debug!("encoding {header:?}");
  sink.write_bytes(&PNG_SIGNATURE)?;
  write_chunk(sink, PngChunkTy::IHDR, &header.to_chunk_data())?;
  write_idat(sink, pixels, row_len, config)?;
  write_chunk(sink, PngChunkTy::IEND, &[])
}

/// Compresses the rows, each behind a `None` filter byte, as `IDAT` chunks.
fn write_idat<K: ByteSink + ?Sized>(
  sink: &mut K, pixels: &[u8], row_len: usize, config: &EncoderConfig,
) -> PngResult<()> {
  let level = i32::from(config.compression_level.min(10));
  let flags = create_comp_flags_from_zip_params(level, 15, 0);
  let mut compressor: Box<CompressorOxide> = Box::new(CompressorOxide::new(flags));

  let mut out: Vec<u8> = Vec::new();
  let out_len = config.idat_buffer_len.max(64);
  out.try_reserve_exact(out_len)?;
  out.resize(out_len, 0);
  let mut out_pos = 0;

  let mut fline: Vec<u8> = Vec::new();
  fline.try_reserve_exact(row_len + 1)?;
  let row_count = pixels.len() / row_len;
  let mut idat_count = 0_usize;
  for (y, row) in pixels.chunks_exact(row_len).enumerate() {
    fline.clear();
    fline.push(0);
    fline.extend_from_slice(row);
    let finishing = y + 1 == row_count;
    let flush = if finishing { TDEFLFlush::Finish } else { TDEFLFlush::None };
    let mut input: &[u8] = &fline;
    loop {
      let (status, bytes_in, bytes_out) =
        compress(&mut compressor, input, &mut out[out_pos..], flush);
      input = &input[bytes_in..];
      out_pos += bytes_out;
      if out_pos == out.len() {
        write_chunk(sink, PngChunkTy::IDAT, &out)?;
        idat_count += 1;
        out_pos = 0;
      }
      match status {
        TDEFLStatus::Done => break,
        TDEFLStatus::Okay if input.is_empty() && !finishing => break,
        TDEFLStatus::Okay if bytes_in == 0 && bytes_out == 0 => {
          log::error!("compressor stalled");
          return Err(PngError::CompressionFailed);
        }
        TDEFLStatus::Okay => continue,
        TDEFLStatus::BadParam | TDEFLStatus::PutBufFailed => {
          log::error!("compressor failed: {status:?}");
          return Err(PngError::CompressionFailed);
        }
      }
    }
  }
  if out_pos > 0 {
    write_chunk(sink, PngChunkTy::IDAT, &out[..out_pos])?;
    idat_count += 1;
  }
  log::debug!("wrote {idat_count} IDAT chunk(s)");
  Ok(())
}

/// Encodes an image into a new `Vec`, with the default config.
#[inline]
pub fn encode_png_to_vec<I: PixelBuffer + ?Sized>(image: &I) -> PngResult<Vec<u8>> {
  let mut out = Vec::new();
  encode_png(image, &mut out, &EncoderConfig::default())?;
  Ok(out)
}
