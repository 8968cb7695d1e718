use super::*;

/// The per-row filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  /// The bytes are stored as is.
  None = 0,
  /// Relative to the byte to the left.
  Sub = 1,
  /// Relative to the byte above.
  Up = 2,
  /// Relative to the floored average of left and above.
  Average = 3,
  /// Relative to whichever of left, above, and upper-left is the best guess.
  Paeth = 4,
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(PngError::UnknownFilterType),
    })
  }
}

/// The Paeth predictor.
///
/// Given the left (`a`), above (`b`), and upper-left (`c`) bytes, picks the
/// one closest to `a + b - c`. Ties go to `a`, then `b`.
#[inline]
#[must_use]
pub const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The order of these tests is part of the format, don't rearrange them.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reverses one row's filter in place.
///
/// * `bpp` is the distance back to the "left" byte.
/// * `prev` is the previous row, already unfiltered, and for the first row of
///   an image it must be all zeroes.
fn unfilter_line(filter: FilterType, bpp: usize, line: &mut [u8], prev: &[u8]) {
  let bpp = bpp.min(line.len());
  match filter {
    FilterType::None => (),
    FilterType::Sub => {
      for i in bpp..line.len() {
        line[i] = line[i].wrapping_add(line[i - bpp]);
      }
    }
    FilterType::Up => {
      line.iter_mut().zip(prev.iter().copied()).for_each(|(x, b)| *x = x.wrapping_add(b));
    }
    FilterType::Average => {
      for (x, b) in line[..bpp].iter_mut().zip(prev.iter().copied()) {
        *x = x.wrapping_add(b / 2);
      }
      for i in bpp..line.len() {
        let a = u16::from(line[i - bpp]);
        let b = u16::from(prev[i]);
        line[i] = line[i].wrapping_add(((a + b) / 2) as u8);
      }
    }
    FilterType::Paeth => {
      // with no left pixel, `a` and `c` are zero and the predictor gives `b`
      for (x, b) in line[..bpp].iter_mut().zip(prev.iter().copied()) {
        *x = x.wrapping_add(b);
      }
      for i in bpp..line.len() {
        line[i] = line[i].wrapping_add(paeth_predict(line[i - bpp], prev[i], prev[i - bpp]));
      }
    }
  }
}

/// Unfilters `height` rows of filtered image data.
///
/// Each input row is one filter byte then `line_len` data bytes. The output is
/// just the data bytes of every row, with no filter bytes.
///
/// ## Failure
/// * `SizeMismatch` if `filtered` isn't exactly `height * (1 + line_len)`.
/// * `UnknownFilterType` for a filter byte over 4.
/// * `UnsupportedFilterForIndexedImage` if `indexed` is set and a row uses any
///   filter other than `None`.
pub fn unfilter_rows(
  filtered: &mut [u8], line_len: usize, height: u32, bpp: usize, indexed: bool,
) -> PngResult<Vec<u8>> {
  let fline_len = line_len + 1;
  if fline_len.checked_mul(height as usize) != Some(filtered.len()) {
    log::error!(
      "expected {height} lines of {fline_len} filtered bytes, got {} bytes",
      filtered.len()
    );
    return Err(PngError::SizeMismatch);
  }
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve_exact(line_len * height as usize)?;
  let mut zero_line: Vec<u8> = Vec::new();
  zero_line.try_reserve_exact(line_len)?;
  zero_line.resize(line_len, 0);

  let mut prev: &[u8] = &zero_line;
  for fline in filtered.chunks_exact_mut(fline_len) {
    let (f, line) = fline.split_at_mut(1);
    let filter = FilterType::try_from(f[0])?;
    if indexed && filter != FilterType::None {
      return Err(PngError::UnsupportedFilterForIndexedImage);
    }
    unfilter_line(filter, bpp, line, prev);
    out.extend_from_slice(line);
    prev = line;
  }
  Ok(out)
}

#[test]
fn test_paeth_tie_breaks() {
  // a wins a tie with c
  assert_eq!(paeth_predict(6, 0, 2), 6);
  // c between a and b predicts exactly
  assert_eq!(paeth_predict(1, 5, 3), 3);
  // b wins ties against c
  assert_eq!(paeth_predict(0, 3, 1), 3);
  // only c is closest
  assert_eq!(paeth_predict(4, 0, 2), 2);
  // no left or upper-left gives the byte above
  assert_eq!(paeth_predict(0, 6, 0), 6);
  assert_eq!(paeth_predict(10, 10, 10), 10);
}

#[test]
fn test_unfilter_rows_sixteen_bit_paeth() {
  // one channel, 16-bit: the left neighbor is two bytes back
  let mut filtered = [0, 10, 20, 10, 20, 4, 5, 5, 1, 1];
  let out = unfilter_rows(&mut filtered, 4, 2, 2, false).unwrap();
  assert_eq!(out, [10, 20, 10, 20, 15, 25, 16, 26]);
}

#[test]
fn test_unfilter_line_each_filter() {
  let prev = [10, 20, 30, 40];
  let mut line = [1, 2, 3, 4];
  unfilter_line(FilterType::Sub, 2, &mut line, &prev);
  assert_eq!(line, [1, 2, 4, 6]);

  let mut line = [1, 2, 3, 4];
  unfilter_line(FilterType::Up, 2, &mut line, &prev);
  assert_eq!(line, [11, 22, 33, 44]);

  let mut line = [1, 2, 3, 4];
  unfilter_line(FilterType::Average, 2, &mut line, &prev);
  // 1+5, 2+10, 3+(6+30)/2, 4+(12+40)/2
  assert_eq!(line, [6, 12, 21, 30]);

  let mut line = [255, 0, 1, 0];
  unfilter_line(FilterType::Sub, 1, &mut line, &[0; 4]);
  assert_eq!(line, [255, 255, 0, 0]);
}
