#![forbid(unsafe_code)]

use super::*;

/// The largest zlib arena allocated up front. Bigger images grow into their
/// full size as data arrives.
const MAX_INITIAL_ARENA: usize = 1 << 20;

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderConfig {
  /// Images wider than this fail with `DimensionsTooLarge`.
  pub max_width: u32,
  /// Images taller than this fail with `DimensionsTooLarge`.
  pub max_height: u32,
  /// An `acTL` declaring more frames than this fails with
  /// `DimensionsTooLarge`, before any canvas is allocated.
  pub max_frames: u32,
}
impl Default for DecoderConfig {
  #[inline]
  fn default() -> Self {
    Self { max_width: 16_384, max_height: 16_384, max_frames: 1024 }
  }
}

/// Animation details of an APNG.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationInfo {
  /// Frames declared by `acTL`.
  pub num_frames: u32,
  /// Times to play, 0 is forever.
  pub num_plays: u32,
  /// If the default image (the `IDAT` data) is the first animation frame.
  ///
  /// When it isn't, it's still decoded as image frame 0, and the animation
  /// starts at image frame 1.
  pub default_image_is_frame: bool,
  /// Every `fcTL` in stream order.
  ///
  /// Dispose and blend ops are reported here but not applied. Each frame is
  /// drawn over a copy of the frame before it.
  pub frames: Vec<fcTL>,
}

/// A decoded PNG.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Png<I> {
  /// The image header.
  pub header: IHDR,
  /// The pixels. Animated images hold one full canvas per frame.
  pub image: I,
  /// Set if the image had an `acTL` chunk.
  pub animation: Option<AnimationInfo>,
}

/// Where the decoder is within the PNG stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DecodeState {
  AwaitSignature,
  AwaitHeader,
  Streaming,
  Done,
  Failed,
}

/// An animation frame whose `fdAT` data is still arriving.
#[derive(Debug)]
struct OpenFrame {
  rect: FrameRect,
  canvas_index: usize,
  session: ZlibSession,
}

struct DecodeSession<'f, F: ImageFactory> {
  factory: &'f mut F,
  config: DecoderConfig,
  state: DecodeState,
  header: Option<IHDR>,
  palette: Option<Vec<[u8; 3]>>,
  alphas: Option<Vec<u8>>,
  image: Option<F::Image>,
  main: Option<ZlibSession>,
  main_done: bool,
  animation: Option<AnimationInfo>,
  open_frame: Option<OpenFrame>,
  frames_done: u32,
  last_sequence: Option<u32>,
}
impl<'f, F: ImageFactory> DecodeSession<'f, F> {
  fn new(factory: &'f mut F, config: DecoderConfig) -> Self {
    Self {
      factory,
      config,
      state: DecodeState::AwaitSignature,
      header: None,
      palette: None,
      alphas: None,
      image: None,
      main: None,
      main_done: false,
      animation: None,
      open_frame: None,
      frames_done: 0,
      last_sequence: None,
    }
  }

  fn set_state(&mut self, state: DecodeState) {
    log::trace!("decode state {:?} -> {state:?}", self.state);
    self.state = state;
  }

  #[inline]
  fn header(&self) -> PngResult<IHDR> {
    self.header.ok_or(PngError::MalformedChunk)
  }

  fn run<S: ByteSource>(&mut self, mut source: S) -> PngResult<()> {
    read_signature(&mut source)?;
    self.set_state(DecodeState::AwaitHeader);
    let mut chunks = RawChunkReader::new(source);
    while self.state != DecodeState::Done {
      let raw = match chunks.next_chunk()? {
        Some(raw) => raw,
        None => {
          log::error!("stream ended at byte {} without IEND", chunks.position());
          return Err(PngError::MalformedChunk);
        }
      };
      self.on_chunk(&raw)?;
    }
    Ok(())
  }

  fn on_chunk(&mut self, raw: &RawPngChunk) -> PngResult<()> {
    let chunk = PngChunk::try_from(raw)?;
    if self.state == DecodeState::AwaitHeader {
      return match chunk {
        PngChunk::IHDR(ihdr) => self.on_header(ihdr),
        _ => {
          log::error!("first chunk is {:?}, expected IHDR", raw.chunk_ty);
          Err(PngError::MalformedChunk)
        }
      };
    }
    match chunk {
      PngChunk::IHDR(_) => {
        log::error!("duplicate IHDR");
        Err(PngError::MalformedChunk)
      }
      PngChunk::PLTE(plte) => self.on_palette(plte),
      PngChunk::tRNS(trns) => self.on_transparency(trns),
      PngChunk::IDAT(data) => self.on_image_data(data),
      PngChunk::IEND => self.on_end(),
      PngChunk::acTL(actl) => self.on_animation_control(actl),
      PngChunk::fcTL(fctl) => self.on_frame_control(fctl),
      PngChunk::fdAT(fdat) => self.on_frame_data(fdat),
      PngChunk::Unknown(ty) => {
        log::warn!("ignoring unknown chunk {ty:?} ({} bytes)", raw.data.len());
        Ok(())
      }
    }
  }

  fn on_header(&mut self, ihdr: IHDR) -> PngResult<()> {
    if ihdr.width > self.config.max_width || ihdr.height > self.config.max_height {
      log::error!(
        "{}x{} is over the {}x{} limit",
        ihdr.width,
        ihdr.height,
        self.config.max_width,
        self.config.max_height
      );
      return Err(PngError::DimensionsTooLarge);
    }
    log::debug!("{ihdr:?}");
    self.header = Some(ihdr);
    self.set_state(DecodeState::Streaming);
    Ok(())
  }

  #[inline]
  fn image_started(&self) -> bool {
    self.main.is_some() || self.main_done
  }

  fn on_palette(&mut self, plte: PLTE<'_>) -> PngResult<()> {
    if self.palette.is_some() || self.image_started() {
      log::error!("PLTE must come once, before the image data");
      return Err(PngError::MalformedChunk);
    }
    let mut entries: Vec<[u8; 3]> = Vec::new();
    entries.try_reserve_exact(plte.entries().len())?;
    entries.extend_from_slice(plte.entries());
    log::debug!("{plte:?}");
    self.palette = Some(entries);
    Ok(())
  }

  fn on_transparency(&mut self, trns: tRNS<'_>) -> PngResult<()> {
    if self.alphas.is_some() || self.image_started() {
      log::error!("tRNS must come once, before the image data");
      return Err(PngError::MalformedChunk);
    }
    if self.header()?.color_type != PngColorType::Index {
      log::debug!("{trns:?} is a color key, not applied");
      return Ok(());
    }
    let Some(palette) = self.palette.as_ref() else {
      log::error!("tRNS before PLTE");
      return Err(PngError::MalformedChunk);
    };
    if trns.to_alphas().len() > palette.len() {
      log::error!("{trns:?} has more entries than the {} color palette", palette.len());
      return Err(PngError::MalformedChunk);
    }
    let mut alphas: Vec<u8> = Vec::new();
    alphas.try_reserve_exact(trns.to_alphas().len())?;
    alphas.extend_from_slice(trns.to_alphas());
    log::debug!("{trns:?}");
    self.alphas = Some(alphas);
    Ok(())
  }

  fn on_animation_control(&mut self, actl: acTL) -> PngResult<()> {
    if self.animation.is_some() {
      log::error!("duplicate acTL");
      return Err(PngError::MalformedChunk);
    }
    if self.image_started() {
      log::warn!("ignoring acTL after the image data, decoding a still image");
      return Ok(());
    }
    if actl.num_frames > self.config.max_frames {
      log::error!("{} frames is over the limit of {}", actl.num_frames, self.config.max_frames);
      return Err(PngError::DimensionsTooLarge);
    }
    log::debug!("{actl:?}");
    self.animation = Some(AnimationInfo {
      num_frames: actl.num_frames,
      num_plays: actl.num_plays,
      default_image_is_frame: false,
      frames: Vec::new(),
    });
    Ok(())
  }

  fn check_sequence(&mut self, sequence_number: u32) -> PngResult<()> {
    match self.last_sequence {
      Some(last) if sequence_number <= last => {
        log::error!("sequence number {sequence_number} follows {last}");
        Err(PngError::MalformedChunk)
      }
      _ => {
        self.last_sequence = Some(sequence_number);
        Ok(())
      }
    }
  }

  /// Allocates the output image, once the image data begins.
  fn start_image(&mut self) -> PngResult<()> {
    let header = self.header()?;
    let indexed = header.color_type == PngColorType::Index;
    if indexed && self.palette.is_none() {
      log::error!("indexed color with no PLTE");
      return Err(PngError::MissingPalette);
    }
    let channels = header.output_channels(self.alphas.is_some());
    let bit_depth = header.output_bit_depth();
    let frame_count = match &self.animation {
      Some(anim) => {
        let extra = u32::from(!anim.default_image_is_frame);
        anim.num_frames.checked_add(extra).ok_or(PngError::DimensionsTooLarge)? as usize
      }
      None => 1,
    };
    let image =
      self.factory.create(header.width, header.height, channels, bit_depth, frame_count)?;
    if image.width() != header.width
      || image.height() != header.height
      || image.channels() != channels
      || image.bit_depth() != bit_depth
      || image.frame_count() != frame_count
    {
      log::error!("image factory made an image of the wrong shape");
      return Err(PngError::SizeMismatch);
    }
    let expected =
      header.filtered_len(header.width, header.height).ok_or(PngError::DimensionsTooLarge)?;
    log::debug!(
      "image is {channels} channels at {bit_depth} bits, {frame_count} frame(s), {expected} bytes \
       of filtered data expected"
    );
    self.image = Some(image);
    self.main = Some(ZlibSession::new(expected.min(MAX_INITIAL_ARENA), expected));
    Ok(())
  }

  /// Unfilters (and maybe palette expands) one finished datastream.
  fn reconstruct(&self, filtered: &mut [u8], width: u32, height: u32) -> PngResult<Vec<u8>> {
    let header = self.header()?;
    let indexed = header.color_type == PngColorType::Index;
    let line_len = header.bytes_per_scanline(width);
    let lines = unfilter_rows(filtered, line_len, height, header.filter_bpp(), indexed)?;
    if indexed {
      let palette = self.palette.as_deref().ok_or(PngError::MissingPalette)?;
      expand_indexed(&lines, width, height, header.bit_depth, palette, self.alphas.as_deref())
    } else {
      Ok(lines)
    }
  }

  fn on_image_data(&mut self, data: &[u8]) -> PngResult<()> {
    if self.main_done {
      log::warn!("ignoring {} bytes of IDAT after the image data ended", data.len());
      return Ok(());
    }
    if self.main.is_none() {
      self.start_image()?;
    }
    let ended = match &mut self.main {
      Some(session) => session.feed(data)?,
      None => return Err(PngError::MalformedChunk),
    };
    if ended {
      self.finish_main()?;
    }
    Ok(())
  }

  fn finish_main(&mut self) -> PngResult<()> {
    let header = self.header()?;
    let session = self.main.take().ok_or(PngError::MalformedChunk)?;
    self.main_done = true;
    let mut filtered = session.into_output();
    let pixels = self.reconstruct(&mut filtered, header.width, header.height)?;
    let image = self.image.as_mut().ok_or(PngError::MalformedChunk)?;
    let frame = image.frame_bytes_mut(0).ok_or(PngError::SizeMismatch)?;
    if frame.len() != pixels.len() {
      return Err(PngError::SizeMismatch);
    }
    frame.copy_from_slice(&pixels);
    if self.animation.as_ref().map_or(false, |anim| anim.default_image_is_frame) {
      self.frames_done += 1;
    }
    log::debug!("default image decoded");
    Ok(())
  }

  fn on_frame_control(&mut self, fctl: fcTL) -> PngResult<()> {
    let header = self.header()?;
    let Some(anim) = self.animation.as_ref() else {
      log::warn!("ignoring fcTL without acTL");
      return Ok(());
    };
    let already = anim.frames.len();
    let num_frames = anim.num_frames;
    let default_is_frame = anim.default_image_is_frame;
    self.check_sequence(fctl.sequence_number)?;
    fctl.check_bounds(header.width, header.height)?;
    if already >= num_frames as usize {
      log::error!("more fcTL chunks than the {num_frames} declared");
      return Err(PngError::MalformedChunk);
    }
    if self.open_frame.is_some() {
      log::error!("fcTL {} arrived before the previous frame's data ended", fctl.sequence_number);
      return Err(PngError::MalformedChunk);
    }
    if !self.image_started() {
      // pairs with the IDAT data, which always covers the full canvas
      if (fctl.x_offset, fctl.y_offset, fctl.width, fctl.height)
        != (0, 0, header.width, header.height)
      {
        log::error!("the first frame's fcTL doesn't match the image size");
        return Err(PngError::FrameOutOfBounds);
      }
      if let Some(anim) = self.animation.as_mut() {
        anim.default_image_is_frame = true;
      }
    } else if self.main_done {
      let expected =
        header.filtered_len(fctl.width, fctl.height).ok_or(PngError::DimensionsTooLarge)?;
      self.open_frame = Some(OpenFrame {
        rect: FrameRect::from(&fctl),
        canvas_index: already + usize::from(!default_is_frame),
        session: ZlibSession::new(expected.min(MAX_INITIAL_ARENA), expected),
      });
    } else {
      log::error!("fcTL in the middle of the IDAT data");
      return Err(PngError::MalformedChunk);
    }
    log::debug!("{fctl:?}");
    if let Some(anim) = self.animation.as_mut() {
      anim.frames.try_reserve(1)?;
      anim.frames.push(fctl);
    }
    Ok(())
  }

  fn on_frame_data(&mut self, fdat: fdAT<'_>) -> PngResult<()> {
    if self.animation.is_none() {
      log::warn!("ignoring fdAT without acTL");
      return Ok(());
    }
    self.check_sequence(fdat.sequence_number)?;
    let ended = match &mut self.open_frame {
      Some(frame) => frame.session.feed(fdat.data)?,
      None => {
        log::error!("fdAT {} has no frame to go with", fdat.sequence_number);
        return Err(PngError::MalformedChunk);
      }
    };
    if ended {
      self.finish_frame()?;
    }
    Ok(())
  }

  fn finish_frame(&mut self) -> PngResult<()> {
    let OpenFrame { rect, canvas_index, session } =
      self.open_frame.take().ok_or(PngError::MalformedChunk)?;
    let mut filtered = session.into_output();
    let pixels = self.reconstruct(&mut filtered, rect.width, rect.height)?;
    let image = self.image.as_mut().ok_or(PngError::MalformedChunk)?;
    if canvas_index > 0 {
      let frame_len = image.row_stride() * image.height() as usize;
      let src = (canvas_index - 1) * frame_len;
      let bytes = image.as_bytes_mut();
      if src + 2 * frame_len > bytes.len() {
        return Err(PngError::FrameOutOfBounds);
      }
      bytes.copy_within(src..src + frame_len, src + frame_len);
    }
    blit_frame(image, canvas_index, rect, &pixels)?;
    self.frames_done += 1;
    log::debug!("frame {canvas_index} decoded at {rect:?}");
    Ok(())
  }

  fn on_end(&mut self) -> PngResult<()> {
    if !self.main_done {
      log::error!("IEND before the image data was complete");
      return Err(PngError::MalformedChunk);
    }
    if self.open_frame.is_some() {
      log::error!("IEND before the last frame's data was complete");
      return Err(PngError::MalformedChunk);
    }
    if let Some(anim) = &self.animation {
      if self.frames_done != anim.num_frames {
        let (declared, decoded) = (anim.num_frames, self.frames_done);
        log::error!("acTL declared {declared} frames but {decoded} were decoded");
        return Err(PngError::MalformedChunk);
      }
    }
    self.set_state(DecodeState::Done);
    Ok(())
  }

  fn into_png(self) -> PngResult<Png<F::Image>> {
    let header = self.header()?;
    let image = self.image.ok_or(PngError::MalformedChunk)?;
    Ok(Png { header, image, animation: self.animation })
  }
}

/// Decodes a PNG (or APNG) from a byte source, into an image made by the
/// factory.
///
/// Animated images produce one full canvas per frame. Frame 0 is always the
/// default image.
pub fn decode_png_with<S: ByteSource, F: ImageFactory>(
  source: S, factory: &mut F, config: &DecoderConfig,
) -> PngResult<Png<F::Image>> {
  let mut session = DecodeSession::new(factory, *config);
  if let Err(e) = session.run(source) {
    log::error!("PNG decode failed in state {:?}: {e}", session.state);
    session.set_state(DecodeState::Failed);
    return Err(e);
  }
  session.into_png()
}

/// Decodes a PNG held in memory, with the default limits.
#[inline]
pub fn decode_png(bytes: &[u8]) -> PngResult<Png<Image>> {
  decode_png_with(SliceSource::new(bytes), &mut DefaultImageFactory, &DecoderConfig::default())
}

/// Gets just the header of a PNG, without decoding any image data.
pub fn read_header(bytes: &[u8]) -> PngResult<IHDR> {
  let mut source = SliceSource::new(bytes);
  read_signature(&mut source)?;
  let raw = RawChunkReader::new(source).next_chunk()?.ok_or(PngError::MalformedChunk)?;
  match PngChunk::try_from(&raw)? {
    PngChunk::IHDR(ihdr) => Ok(ihdr),
    _ => Err(PngError::MalformedChunk),
  }
}
