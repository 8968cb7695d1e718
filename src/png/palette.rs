use super::*;

/// Unpacks one row of `bit_depth` sized indexes, most significant bits first.
///
/// Any padding bits at the end of the row's last byte are skipped.
#[inline]
fn row_indexes(row: &[u8], bit_depth: u8, width: usize) -> impl Iterator<Item = u8> + '_ {
  let per_byte = 8 / bit_depth;
  let mask = ((1_u16 << bit_depth) - 1) as u8;
  row
    .iter()
    .flat_map(move |&byte| {
      (1..=per_byte).map(move |k| (byte >> (8 - k * bit_depth)) & mask)
    })
    .take(width)
}

/// Expands unfiltered indexed scanlines into RGB or RGBA bytes.
///
/// * `scanlines` is `height` rows of `ceil(width * bit_depth / 8)` bytes.
/// * With `alphas` the output is RGBA. Indexes past the end of `alphas` are
///   fully transparent.
/// * Indexes past the end of the palette become black.
///
/// ## Failure
/// * `UnsupportedBitDepth` unless `bit_depth` is 1, 2, 4, or 8.
/// * `SizeMismatch` if `scanlines` has the wrong length.
pub fn expand_indexed(
  scanlines: &[u8], width: u32, height: u32, bit_depth: u8, palette: &[[u8; 3]],
  alphas: Option<&[u8]>,
) -> PngResult<Vec<u8>> {
  if !matches!(bit_depth, 1 | 2 | 4 | 8) {
    return Err(PngError::UnsupportedBitDepth);
  }
  let width = width as usize;
  let line_len = (width * usize::from(bit_depth) + 7) / 8;
  if line_len.checked_mul(height as usize) != Some(scanlines.len()) {
    return Err(PngError::SizeMismatch);
  }
  let channels = if alphas.is_some() { 4 } else { 3 };
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve_exact(width * height as usize * channels)?;
  for row in scanlines.chunks_exact(line_len.max(1)) {
    for i in row_indexes(row, bit_depth, width) {
      let i = usize::from(i);
      let [r, g, b] = palette.get(i).copied().unwrap_or_default();
      out.extend_from_slice(&[r, g, b]);
      if let Some(alphas) = alphas {
        out.push(alphas.get(i).copied().unwrap_or(0));
      }
    }
  }
  Ok(out)
}

#[test]
fn test_row_indexes_msb_first() {
  let row = [0b1011_0001];
  assert!(row_indexes(&row, 1, 8).eq([1, 0, 1, 1, 0, 0, 0, 1]));
  assert!(row_indexes(&row, 2, 3).eq([0b10, 0b11, 0b00]));
  assert!(row_indexes(&row, 4, 2).eq([0b1011, 0b0001]));
  assert!(row_indexes(&row, 8, 1).eq([0b1011_0001]));
}

#[test]
fn test_expand_indexed_alpha_bounds() {
  let palette = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];
  // two rows of 3 pixels at 2 bits, each row padded to one byte
  let scanlines = [0b00_01_10_00, 0b10_11_00_00];
  let rgb = expand_indexed(&scanlines, 3, 2, 2, &palette, None).unwrap();
  assert_eq!(
    rgb,
    [255, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 255, 0, 0, 0, 255, 0, 0]
  );

  let rgba = expand_indexed(&[0, 1, 2], 3, 1, 8, &palette, Some(&[9, 99])).unwrap();
  assert_eq!(rgba, [255, 0, 0, 9, 0, 255, 0, 99, 0, 0, 255, 0]);

  assert_eq!(
    expand_indexed(&[0, 1], 3, 1, 8, &palette, None),
    Err(PngError::SizeMismatch)
  );
}
