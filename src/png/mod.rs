//! Holds all the tools for decoding and encoding PNG data.
//!
//! ## Automated PNG Decoding
//! If you don't need control over the decoding process, [`decode_png`] takes
//! the bytes of a PNG and gives back a [`Png`] holding an [`Image`] of the
//! pixels (along with the header, and animation info for an APNG).
//!
//! For other inputs or image types, [`decode_png_with`] reads from any
//! [`ByteSource`] into an image made by any [`ImageFactory`].
//!
//! ## How A PNG Is Put Together
//!
//! A PNG is an 8 byte signature followed by "chunks". Each chunk is a length,
//! a 4 letter type, the data, and a CRC of the type and data. The chunks this
//! crate acts on are:
//! * **Header** (`IHDR`) - Always first. The image's dimensions and pixel
//!   format.
//! * **Palette** (`PLTE`) - If an image uses indexed color, this maps index
//!   values to RGB values.
//! * **Transparency** (`tRNS`) - For indexed color, an alpha value for each
//!   palette entry.
//! * **Image Data** (`IDAT`) - One or more chunks which together form a single
//!   zlib datastream.
//! * **End** (`IEND`) - The last chunk, lets you know you had the full PNG.
//! * **Animation** (`acTL`, `fcTL`, `fdAT`) - The APNG extension. Each frame
//!   after the first gets a frame control chunk and its own zlib datastream
//!   split across frame data chunks.
//!
//! Other chunk types are skipped.
//!
//! When storing the PNG, each row of pixels is first "filtered" (to try and
//! make it more compression-friendly), and then all the rows are compressed.
//! To decode the PNG you decompress and then unfilter. Indexed images also
//! have their indexes (possibly several per byte) looked up in the palette.
//!
//! ## Limitations
//! * Interlaced images are rejected with `InterlacingUnsupported`.
//! * Greyscale and RGB images must be 8 or 16 bits per channel.
//! * APNG dispose and blend ops are reported but not applied.
//! * The encoder only writes 8-bit images, and doesn't filter rows.
//!
//! ## Working With Chunks Directly
//!
//! [`RawChunkReader`] iterates the CRC checked chunks of a stream, and
//! [`PngChunk`] parses each one.
//!
//! ```no_run
//! use pngine::{png::*, SliceSource};
//! # fn f(png: &[u8]) -> pngine::PngResult<()> {
//! let mut source = SliceSource::new(png);
//! read_signature(&mut source)?;
//! for raw in RawChunkReader::new(source) {
//!   let raw = raw?;
//!   println!("{:?}", PngChunk::try_from(&raw)?);
//! }
//! # Ok(())
//! # }
//! ```

use alloc::{boxed::Box, vec::Vec};
use bytemuck::{Pod, Zeroable};
use core::fmt::{Debug, Write};

use crate::{
  image::{pixel_byte_index, DefaultImageFactory, Image, ImageFactory, PixelBuffer},
  int_endian::{pod_from_exact, U16BE, U32BE},
  stream::{ByteSink, ByteSource, SliceSource},
  PngError, PngResult,
};

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

mod crc32;
pub use crc32::*;

mod raw_chunk;
pub use raw_chunk::*;

mod png_chunk;
pub use png_chunk::*;

mod ihdr;
pub use ihdr::*;

mod plte;
pub use plte::*;

mod trns;
pub use trns::*;

mod actl;
pub use actl::*;

mod fctl;
pub use fctl::*;

mod fdat;
pub use fdat::*;

mod inflate;
pub use inflate::*;

mod unfilter;
pub use unfilter::*;

mod palette;
pub use palette::*;

mod compositor;
pub use compositor::*;

mod decoder;
pub use decoder::*;

mod encoder;
pub use encoder::*;

#[cfg(test)]
mod tests;
