use super::*;

/// Where a sub-frame goes on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameRect {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}
impl From<&fcTL> for FrameRect {
  #[inline]
  fn from(f: &fcTL) -> Self {
    Self { x: f.x_offset, y: f.y_offset, width: f.width, height: f.height }
  }
}

/// Copies a decoded sub-frame onto one frame of the canvas.
///
/// `pixels` holds `rect.width * rect.height` pixels in the same channel count
/// and bit depth as `canvas`. Every pixel of the rectangle is overwritten, no
/// blending is done.
///
/// ## Failure
/// * `FrameOutOfBounds` if the rectangle leaves the canvas or `frame` doesn't
///   exist.
/// * `SizeMismatch` if `pixels` is the wrong length.
pub fn blit_frame<B: PixelBuffer + ?Sized>(
  canvas: &mut B, frame: usize, rect: FrameRect, pixels: &[u8],
) -> PngResult<()> {
  let (canvas_w, canvas_h) = (canvas.width(), canvas.height());
  let channels = canvas.channels();
  let bpc = canvas.bytes_per_channel();
  let in_x = rect.x.checked_add(rect.width).map_or(false, |end| end <= canvas_w);
  let in_y = rect.y.checked_add(rect.height).map_or(false, |end| end <= canvas_h);
  if !in_x || !in_y || frame >= canvas.frame_count() {
    return Err(PngError::FrameOutOfBounds);
  }
  let src_row_len = rect.width as usize * channels * bpc;
  if src_row_len * rect.height as usize != pixels.len() {
    return Err(PngError::SizeMismatch);
  }
  if src_row_len == 0 {
    return Ok(());
  }
  let dst = canvas.as_bytes_mut();
  for (row, src) in (0..rect.height).zip(pixels.chunks_exact(src_row_len)) {
    let start = pixel_byte_index(
      frame,
      rect.x,
      rect.y + row,
      0,
      canvas_w,
      canvas_h,
      channels,
      bpc,
    );
    let dst_row = dst.get_mut(start..start + src_row_len).ok_or(PngError::FrameOutOfBounds)?;
    dst_row.copy_from_slice(src);
  }
  Ok(())
}

#[test]
fn test_blit_frame_offsets() {
  let mut canvas = Image::try_new(3, 3, 1, 8, 2).unwrap();
  let rect = FrameRect { x: 1, y: 1, width: 2, height: 2 };
  blit_frame(&mut canvas, 1, rect, &[1, 2, 3, 4]).unwrap();
  assert_eq!(&canvas.pixels[..9], &[0; 9]);
  assert_eq!(&canvas.pixels[9..], &[0, 0, 0, 0, 1, 2, 0, 3, 4]);

  let too_far = FrameRect { x: 2, y: 1, width: 2, height: 2 };
  assert_eq!(blit_frame(&mut canvas, 1, too_far, &[0; 4]), Err(PngError::FrameOutOfBounds));
  assert_eq!(blit_frame(&mut canvas, 2, rect, &[0; 4]), Err(PngError::FrameOutOfBounds));
  assert_eq!(blit_frame(&mut canvas, 0, rect, &[0; 3]), Err(PngError::SizeMismatch));
}
