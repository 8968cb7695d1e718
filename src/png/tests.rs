use super::*;
use alloc::vec;

fn zlib(data: &[u8]) -> Vec<u8> {
  miniz_oxide::deflate::compress_to_vec_zlib(data, 6)
}

fn ihdr_data(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
  let mut v = Vec::new();
  v.extend_from_slice(&width.to_be_bytes());
  v.extend_from_slice(&height.to_be_bytes());
  v.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
  v
}

fn fctl_data(sequence_number: u32, width: u32, height: u32, x: u32, y: u32) -> Vec<u8> {
  let mut v = Vec::new();
  for n in [sequence_number, width, height, x, y] {
    v.extend_from_slice(&n.to_be_bytes());
  }
  v.extend_from_slice(&[0, 1, 0, 10, 0, 0]);
  v
}

fn fdat_data(sequence_number: u32, filtered: &[u8]) -> Vec<u8> {
  let mut v = sequence_number.to_be_bytes().to_vec();
  v.extend_from_slice(&zlib(filtered));
  v
}

/// Writes hand made chunk streams.
struct PngBuilder(Vec<u8>);
impl PngBuilder {
  fn new() -> Self {
    Self(PNG_SIGNATURE.to_vec())
  }
  fn chunk(mut self, ty: &[u8; 4], data: &[u8]) -> Self {
    write_chunk(&mut self.0, PngChunkTy(*ty), data).unwrap();
    self
  }
  fn finish(self) -> Vec<u8> {
    self.0
  }
}

/// A one channel, 8-bit image from pre-filtered rows.
fn grey_png(width: u32, height: u32, filtered: &[u8]) -> Vec<u8> {
  PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(width, height, 8, 0))
    .chunk(b"IDAT", &zlib(filtered))
    .chunk(b"IEND", &[])
    .finish()
}

#[test]
fn test_each_filter_on_2x2() {
  let cases: [(&[u8], [u8; 4]); 5] = [
    (&[0, 10, 20, 0, 15, 25], [10, 20, 15, 25]),
    (&[1, 10, 5, 1, 1, 2], [10, 15, 1, 3]),
    (&[0, 10, 20, 2, 5, 5], [10, 20, 15, 25]),
    (&[3, 10, 20, 3, 4, 4], [10, 25, 9, 21]),
    (&[4, 10, 20, 4, 1, 1], [10, 30, 11, 31]),
  ];
  for (filtered, expected) in cases {
    let png = decode_png(&grey_png(2, 2, filtered)).unwrap();
    assert_eq!(png.image.pixels, expected, "filtered: {filtered:?}");
    assert_eq!((png.image.width, png.image.height, png.image.channels), (2, 2, 1));
  }
}

#[test]
fn test_bad_filter_bytes() {
  assert_eq!(decode_png(&grey_png(2, 1, &[5, 1, 2])), Err(PngError::UnknownFilterType));
  assert_eq!(decode_png(&grey_png(2, 1, &[0, 1])), Err(PngError::SizeMismatch));
}

#[test]
fn test_minimal_red_pixel() {
  let image = Image::from_u8_pixels(1, 1, 3, vec![255, 0, 0]).unwrap();
  let bytes = encode_png_to_vec(&image).unwrap();
  assert_eq!(&bytes[..8], &PNG_SIGNATURE);
  let png = decode_png(&bytes).unwrap();
  assert_eq!(png.header.color_type, PngColorType::RGB);
  assert_eq!((png.image.width, png.image.height, png.image.channels), (1, 1, 3));
  assert_eq!(png.image.pixels, [255, 0, 0]);
  assert!(png.animation.is_none());
}

#[test]
fn test_any_bit_flip_is_a_crc_mismatch() {
  let image = Image::from_u8_pixels(2, 2, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
  let bytes = encode_png_to_vec(&image).unwrap();
  let mut pos = 8;
  while pos < bytes.len() {
    let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
    // the type and data of this chunk
    for i in (pos + 4)..(pos + 8 + len) {
      for bit in 0..8 {
        let mut flipped = bytes.clone();
        flipped[i] ^= 1 << bit;
        assert_eq!(decode_png(&flipped), Err(PngError::CrcMismatch), "byte {i} bit {bit}");
      }
    }
    pos += 12 + len;
  }
}

#[test]
fn test_truncated_streams_fail() {
  let header_only = PngBuilder::new().chunk(b"IHDR", &ihdr_data(1, 1, 8, 0)).finish();
  assert_eq!(decode_png(&header_only), Err(PngError::MalformedChunk));

  let full = grey_png(1, 1, &[0, 7]);
  assert_eq!(decode_png(&full).unwrap().image.pixels, [7]);
  for cut in 8..full.len() {
    assert!(decode_png(&full[..cut]).is_err(), "cut at {cut}");
  }
  assert_eq!(decode_png(&full[..4]), Err(PngError::BadSignature));
  assert_eq!(decode_png(&[]), Err(PngError::BadSignature));
}

#[test]
fn test_header_rejections() {
  let mut interlaced = ihdr_data(4, 4, 8, 2);
  interlaced[12] = 1;
  let png = PngBuilder::new().chunk(b"IHDR", &interlaced).finish();
  assert_eq!(read_header(&png), Err(PngError::InterlacingUnsupported));
  assert_eq!(decode_png(&png), Err(PngError::InterlacingUnsupported));

  let cases = [
    (ihdr_data(0, 4, 8, 2), PngError::WidthOrHeightZero),
    (ihdr_data(4, 4, 8, 1), PngError::UnsupportedColorType),
    (ihdr_data(4, 4, 4, 0), PngError::UnsupportedBitDepth),
    (ihdr_data(4, 4, 16, 3), PngError::UnsupportedBitDepth),
  ];
  for (data, err) in cases {
    assert_eq!(decode_png(&PngBuilder::new().chunk(b"IHDR", &data).finish()), Err(err));
  }
  let mut bad_compression = ihdr_data(4, 4, 8, 2);
  bad_compression[10] = 1;
  assert_eq!(
    read_header(&PngBuilder::new().chunk(b"IHDR", &bad_compression).finish()),
    Err(PngError::UnsupportedCompressionMethod)
  );
  let mut bad_filter = ihdr_data(4, 4, 8, 2);
  bad_filter[11] = 1;
  assert_eq!(
    read_header(&PngBuilder::new().chunk(b"IHDR", &bad_filter).finish()),
    Err(PngError::UnsupportedFilterMethod)
  );

  let not_first = PngBuilder::new()
    .chunk(b"IDAT", &zlib(&[0, 0]))
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 0))
    .finish();
  assert_eq!(decode_png(&not_first), Err(PngError::MalformedChunk));
}

#[test]
fn test_dimension_limits() {
  let png = grey_png(3, 1, &[0, 1, 2, 3]);
  let config = DecoderConfig { max_width: 2, max_height: 2, ..DecoderConfig::default() };
  assert_eq!(
    decode_png_with(SliceSource::new(&png), &mut DefaultImageFactory, &config),
    Err(PngError::DimensionsTooLarge)
  );
  assert_eq!(read_header(&png).unwrap().width, 3);
}

/// Counts `create` calls, handing out default images.
struct CountingFactory(usize);
impl ImageFactory for CountingFactory {
  type Image = Image;
  fn create(
    &mut self, width: u32, height: u32, channels: usize, bit_depth: u8, frame_count: usize,
  ) -> PngResult<Image> {
    self.0 += 1;
    Image::try_new(width, height, channels, bit_depth, frame_count)
  }
}

#[test]
fn test_frame_count_limit() {
  let huge = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 6))
    .chunk(b"acTL", &[0xFF, 0xFF, 0xFF, 0xFE, 0, 0, 0, 0])
    .chunk(b"IDAT", &zlib(&[0, 1, 2, 3, 4]))
    .chunk(b"IEND", &[])
    .finish();
  let mut factory = CountingFactory(0);
  assert_eq!(
    decode_png_with(SliceSource::new(&huge), &mut factory, &DecoderConfig::default()),
    Err(PngError::DimensionsTooLarge)
  );
  assert_eq!(factory.0, 0);

  let two_frames = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 0))
    .chunk(b"acTL", &[0, 0, 0, 2, 0, 0, 0, 0])
    .chunk(b"fcTL", &fctl_data(0, 1, 1, 0, 0))
    .chunk(b"IDAT", &zlib(&[0, 1]))
    .chunk(b"fcTL", &fctl_data(1, 1, 1, 0, 0))
    .chunk(b"fdAT", &fdat_data(2, &[0, 2]))
    .chunk(b"IEND", &[])
    .finish();
  let one = DecoderConfig { max_frames: 1, ..DecoderConfig::default() };
  assert_eq!(
    decode_png_with(SliceSource::new(&two_frames), &mut factory, &one),
    Err(PngError::DimensionsTooLarge)
  );
  assert_eq!(factory.0, 0);
  let png =
    decode_png_with(SliceSource::new(&two_frames), &mut factory, &DecoderConfig::default())
      .unwrap();
  assert_eq!(png.image.pixels, [1, 2]);
  assert_eq!(factory.0, 1);
}

#[test]
fn test_indexed_with_transparency() {
  let palette = [255, 0, 0, 0, 255, 0, 0, 0, 255];
  // 3x2 at 2 bits per index, rows padded to a byte
  let filtered = [0, 0b00_01_10_00, 0, 0b10_11_00_00];
  let bytes = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(3, 2, 2, 3))
    .chunk(b"PLTE", &palette)
    .chunk(b"tRNS", &[128, 64])
    .chunk(b"IDAT", &zlib(&filtered))
    .chunk(b"IEND", &[])
    .finish();
  let png = decode_png(&bytes).unwrap();
  assert_eq!(png.image.channels, 4);
  assert_eq!(png.image.bit_depth, 8);
  assert_eq!(
    png.image.to_rgba8(0).unwrap(),
    [
      [255, 0, 0, 128],
      [0, 255, 0, 64],
      [0, 0, 255, 0],
      [0, 0, 255, 0],
      [0, 0, 0, 0],
      [255, 0, 0, 128],
    ]
  );

  let opaque = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(3, 1, 8, 3))
    .chunk(b"PLTE", &palette)
    .chunk(b"IDAT", &zlib(&[0, 2, 1, 0]))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&opaque).unwrap().image.pixels, [0, 0, 255, 0, 255, 0, 255, 0, 0]);
}

#[test]
fn test_indexed_failures() {
  let no_palette = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 3))
    .chunk(b"IDAT", &zlib(&[0, 0]))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&no_palette), Err(PngError::MissingPalette));

  let filtered_index = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(2, 1, 8, 3))
    .chunk(b"PLTE", &[1, 2, 3])
    .chunk(b"IDAT", &zlib(&[1, 0, 0]))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&filtered_index), Err(PngError::UnsupportedFilterForIndexedImage));

  let partial_entry = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 3))
    .chunk(b"PLTE", &[1, 2])
    .finish();
  assert_eq!(decode_png(&partial_entry), Err(PngError::MalformedChunk));

  let alphas_first = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 3))
    .chunk(b"tRNS", &[0])
    .chunk(b"PLTE", &[1, 2, 3])
    .chunk(b"IDAT", &zlib(&[0, 0]))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&alphas_first), Err(PngError::MalformedChunk));

  let too_many_alphas = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 3))
    .chunk(b"PLTE", &[1, 2, 3])
    .chunk(b"tRNS", &[0, 0])
    .chunk(b"IDAT", &zlib(&[0, 0]))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&too_many_alphas), Err(PngError::MalformedChunk));

  let color_key = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 8, 0))
    .chunk(b"tRNS", &[0, 9])
    .chunk(b"IDAT", &zlib(&[0, 9]))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&color_key).unwrap().image.channels, 1);
}

#[test]
fn test_split_idat_and_unknown_chunks() {
  let compressed = zlib(&[0, 1, 2, 3, 0, 4, 5, 6]);
  let (a, rest) = compressed.split_at(3);
  let (b, c) = rest.split_at(1);
  let bytes = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(3, 2, 8, 0))
    .chunk(b"tEXt", b"Comment\0hello")
    .chunk(b"IDAT", a)
    .chunk(b"IDAT", &[])
    .chunk(b"IDAT", b)
    .chunk(b"IDAT", c)
    .chunk(b"zzZZ", &[9, 9])
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&bytes).unwrap().image.pixels, [1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_sixteen_bit_rgb_stays_big_endian() {
  let filtered = [0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
  let bytes = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(1, 1, 16, 2))
    .chunk(b"IDAT", &zlib(&filtered))
    .chunk(b"IEND", &[])
    .finish();
  let png = decode_png(&bytes).unwrap();
  assert_eq!(png.image.bit_depth, 16);
  assert_eq!(png.image.get(0, 0, 1), Some(0x5678));
  assert_eq!(png.image.to_rgba8(0).unwrap(), [[0x12, 0x56, 0x9A, 255]]);
}

#[test]
fn test_sixteen_bit_paeth_uses_two_byte_pixels() {
  let filtered = [0, 10, 20, 10, 20, 4, 5, 5, 1, 1];
  let bytes = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(2, 2, 16, 0))
    .chunk(b"IDAT", &zlib(&filtered))
    .chunk(b"IEND", &[])
    .finish();
  let png = decode_png(&bytes).unwrap();
  assert_eq!(png.image.pixels, [10, 20, 10, 20, 15, 25, 16, 26]);
  assert_eq!(png.image.get(0, 1, 0), Some(0x0F19));
}

#[test]
fn test_apng_frames_are_composited() {
  let bytes = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(2, 2, 8, 0))
    .chunk(b"acTL", &[0, 0, 0, 2, 0, 0, 0, 3])
    .chunk(b"fcTL", &fctl_data(0, 2, 2, 0, 0))
    .chunk(b"IDAT", &zlib(&[0, 1, 2, 0, 3, 4]))
    .chunk(b"fcTL", &fctl_data(1, 1, 1, 1, 1))
    .chunk(b"fdAT", &fdat_data(2, &[0, 9]))
    .chunk(b"IEND", &[])
    .finish();
  let png = decode_png(&bytes).unwrap();
  assert_eq!(png.image.frame_count, 2);
  assert_eq!(png.image.pixels, [1, 2, 3, 4, 1, 2, 3, 9]);
  let anim = png.animation.unwrap();
  assert_eq!((anim.num_frames, anim.num_plays), (2, 3));
  assert!(anim.default_image_is_frame);
  assert_eq!(anim.frames.len(), 2);
  assert_eq!((anim.frames[1].x_offset, anim.frames[1].y_offset), (1, 1));
  assert_eq!(anim.frames[1].delay_millis(), 100);
}

#[test]
fn test_apng_default_image_outside_animation() {
  let bytes = PngBuilder::new()
    .chunk(b"IHDR", &ihdr_data(2, 1, 8, 0))
    .chunk(b"acTL", &[0, 0, 0, 1, 0, 0, 0, 0])
    .chunk(b"IDAT", &zlib(&[0, 5, 6]))
    .chunk(b"fcTL", &fctl_data(0, 1, 1, 0, 0))
    .chunk(b"fdAT", &fdat_data(1, &[0, 7]))
    .chunk(b"IEND", &[])
    .finish();
  let png = decode_png(&bytes).unwrap();
  assert_eq!(png.image.frame_count, 2);
  assert_eq!(png.image.pixels, [5, 6, 7, 6]);
  assert!(!png.animation.unwrap().default_image_is_frame);
}

#[test]
fn test_apng_failures() {
  let ihdr = ihdr_data(2, 2, 8, 0);
  let idat = zlib(&[0, 1, 2, 0, 3, 4]);
  let actl_two = [0, 0, 0, 2, 0, 0, 0, 0];

  let missing_frame = PngBuilder::new()
    .chunk(b"IHDR", &ihdr)
    .chunk(b"acTL", &actl_two)
    .chunk(b"fcTL", &fctl_data(0, 2, 2, 0, 0))
    .chunk(b"IDAT", &idat)
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&missing_frame), Err(PngError::MalformedChunk));

  let open_frame = PngBuilder::new()
    .chunk(b"IHDR", &ihdr)
    .chunk(b"acTL", &actl_two)
    .chunk(b"fcTL", &fctl_data(0, 2, 2, 0, 0))
    .chunk(b"IDAT", &idat)
    .chunk(b"fcTL", &fctl_data(1, 1, 1, 0, 0))
    .chunk(b"IEND", &[])
    .finish();
  assert_eq!(decode_png(&open_frame), Err(PngError::MalformedChunk));

  let backwards = PngBuilder::new()
    .chunk(b"IHDR", &ihdr)
    .chunk(b"acTL", &actl_two)
    .chunk(b"fcTL", &fctl_data(4, 2, 2, 0, 0))
    .chunk(b"IDAT", &idat)
    .chunk(b"fcTL", &fctl_data(3, 1, 1, 0, 0))
    .finish();
  assert_eq!(decode_png(&backwards), Err(PngError::MalformedChunk));

  let outside = PngBuilder::new()
    .chunk(b"IHDR", &ihdr)
    .chunk(b"acTL", &actl_two)
    .chunk(b"fcTL", &fctl_data(0, 2, 2, 0, 0))
    .chunk(b"IDAT", &idat)
    .chunk(b"fcTL", &fctl_data(1, 2, 1, 1, 0))
    .finish();
  assert_eq!(decode_png(&outside), Err(PngError::FrameOutOfBounds));

  let orphan_data = PngBuilder::new()
    .chunk(b"IHDR", &ihdr)
    .chunk(b"acTL", &actl_two)
    .chunk(b"IDAT", &idat)
    .chunk(b"fdAT", &fdat_data(0, &[0, 1]))
    .finish();
  assert_eq!(decode_png(&orphan_data), Err(PngError::MalformedChunk));
}

#[test]
fn test_encoder_rejections() {
  let wide = Image::try_new(1, 1, 1, 16, 1).unwrap();
  assert_eq!(encode_png_to_vec(&wide), Err(PngError::UnsupportedBitDepth));
  let empty = Image::from_u8_pixels(0, 3, 1, Vec::new()).unwrap();
  assert_eq!(encode_png_to_vec(&empty), Err(PngError::WidthOrHeightZero));
  let mut short = Image::from_u8_pixels(2, 2, 1, vec![0; 4]).unwrap();
  short.pixels.pop();
  assert_eq!(encode_png_to_vec(&short), Err(PngError::SizeMismatch));
}

#[test]
fn test_small_idat_buffer_writes_many_idats() {
  let pixels: Vec<u8> = (0..64 * 64 * 4).map(|i| (i * 31 % 256) as u8).collect();
  let image = Image::from_u8_pixels(64, 64, 4, pixels).unwrap();
  let mut bytes = Vec::new();
  let config = EncoderConfig { compression_level: 1, idat_buffer_len: 100 };
  encode_png(&image, &mut bytes, &config).unwrap();

  let mut source = SliceSource::new(&bytes);
  read_signature(&mut source).unwrap();
  let chunks: Vec<RawPngChunk> = RawChunkReader::new(source).map(Result::unwrap).collect();
  let idats: Vec<&RawPngChunk> =
    chunks.iter().filter(|c| c.chunk_ty == PngChunkTy::IDAT).collect();
  assert!(idats.len() > 1);
  assert!(idats.iter().all(|c| c.data.len() <= 100));
  assert_eq!(chunks.first().unwrap().chunk_ty, PngChunkTy::IHDR);
  assert_eq!(chunks.last().unwrap().chunk_ty, PngChunkTy::IEND);

  assert_eq!(decode_png(&bytes).unwrap().image, image);
}

#[test]
fn test_chunk_reader_stops_after_iend() {
  let mut bytes = grey_png(1, 1, &[0, 0]);
  bytes.extend_from_slice(b"trailing garbage");
  let mut source = SliceSource::new(&bytes);
  read_signature(&mut source).unwrap();
  let mut reader = RawChunkReader::new(source);
  let tys: Vec<PngChunkTy> = reader.by_ref().map(|c| c.unwrap().chunk_ty).collect();
  assert_eq!(tys, [PngChunkTy::IHDR, PngChunkTy::IDAT, PngChunkTy::IEND]);
  assert!(reader.is_finished());
  assert!(reader.next().is_none());
  assert_eq!(reader.into_inner().remaining(), b"trailing garbage");
}
