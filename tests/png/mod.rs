use pngine::{
  png::{
    decode_png, decode_png_with, encode_png, encode_png_to_vec, read_signature, DecoderConfig,
    EncoderConfig, RawChunkReader, PNG_SIGNATURE,
  },
  DefaultImageFactory, Image, IoSink, IoSource, PngError, SliceSource,
};
use walkdir::WalkDir;

#[test]
fn test_RawChunkReader_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in RawChunkReader::new(SliceSource::new(&v)) {
      //
    }
    let _ = decode_png(&v);
  }
  // even totally random data should never panic the reader!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in RawChunkReader::new(SliceSource::new(&v)) {
      //
    }
  }
}

#[test]
fn test_decode_png_random_bodies_no_panics() {
  // a real signature gets the random bytes past the first check
  for _ in 0..50 {
    let mut v = PNG_SIGNATURE.to_vec();
    v.extend(super::rand_bytes(512));
    assert!(decode_png(&v).is_err());
  }
}

#[test]
fn test_corrupting_a_real_png_no_panics() {
  let pixels = super::rand_bytes(16 * 16 * 4);
  let image = Image::from_u8_pixels(16, 16, 4, pixels).unwrap();
  let bytes = encode_png_to_vec(&image).unwrap();
  let noise = super::rand_bytes(200);
  for (n, pair) in noise.chunks_exact(2).enumerate() {
    let mut v = bytes.clone();
    let i = 8 + (usize::from(pair[0]) * 7 + n) % (v.len() - 8);
    v[i] ^= pair[1] | 1;
    assert!(decode_png(&v).is_err(), "flipped byte {i}");
  }
}

#[test]
fn test_round_trip_every_channel_count() {
  for channels in 1..=4 {
    for (width, height) in [(1, 1), (7, 3), (33, 17)] {
      let pixels = super::rand_bytes(width as usize * height as usize * channels);
      let image = Image::from_u8_pixels(width, height, channels, pixels).unwrap();
      let bytes = encode_png_to_vec(&image).unwrap();
      let png = decode_png(&bytes).unwrap();
      assert_eq!(png.image, image, "{channels} channels, {width}x{height}");
      assert_eq!(png.header.bit_depth, 8);
    }
  }
}

#[test]
fn test_io_source_and_sink() {
  let image = Image::from_u8_pixels(3, 2, 2, super::rand_bytes(12)).unwrap();
  let mut sink = IoSink::new(Vec::new());
  encode_png(&image, &mut sink, &EncoderConfig::default()).unwrap();
  let bytes = sink.into_inner();

  let source = IoSource::new(std::io::Cursor::new(bytes.clone()));
  let png = decode_png_with(source, &mut DefaultImageFactory, &DecoderConfig::default()).unwrap();
  assert_eq!(png.image, image);

  let mut source = IoSource::new(std::io::Cursor::new(&bytes[..bytes.len() - 1]));
  read_signature(&mut source).unwrap();
  let results: Vec<_> = RawChunkReader::new(source).collect();
  assert_eq!(results.last(), Some(&Err(PngError::MalformedChunk)));
}

#[test]
fn test_to_rgba8_from_grey_alpha() {
  let image = Image::from_u8_pixels(2, 1, 2, vec![10, 20, 30, 40]).unwrap();
  let png = decode_png(&encode_png_to_vec(&image).unwrap()).unwrap();
  assert_eq!(png.image.to_rgba8(0).unwrap(), [[10, 10, 10, 20], [30, 30, 30, 40]]);
}
