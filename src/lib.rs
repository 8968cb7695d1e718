#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A crate for PNG and APNG decoding and encoding.
//!
//! * [`png::decode_png`] turns PNG bytes into an [`Image`].
//! * [`png::encode_png_to_vec`] goes the other way, for 8-bit images.
//! * The [`png`] module also has all the pieces (chunk reader, unfiltering,
//!   palette expansion, etc) if you'd like to do things yourself.
//!
//! The crate is `no_std`, but it does need `alloc`. The `std` feature (on by
//! default) adds [`IoSource`] and [`IoSink`] to work with `std::io` streams.
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. No logger
//! is installed, that's up to the application.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod int_endian;
pub use int_endian::{U16BE, U32BE};

mod stream;
pub use stream::*;

pub mod image;
pub use image::{DefaultImageFactory, Image, ImageFactory, PixelBuffer};

pub mod png;
