//! Big-endian integer fields for reading fixed-layout chunk payloads.
//!
//! PNG stores every multi-byte integer in network byte order. These wrappers
//! have an alignment of 1, so a `#[repr(C)]` struct built out of them can be
//! read directly from unaligned chunk data with [`bytemuck`].

use bytemuck::{Pod, Zeroable};

/// A `u16` stored as big-endian bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct U16BE([u8; 2]);
impl U16BE {
  /// Convert this value to a native `u16`
  #[inline]
  #[must_use]
  pub const fn to_u16(self) -> u16 {
    u16::from_be_bytes(self.0)
  }
  /// Make a value from a native `u16`
  #[inline]
  #[must_use]
  pub const fn from_u16(u: u16) -> Self {
    Self(u.to_be_bytes())
  }
}
impl core::fmt::Debug for U16BE {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("U16BE").field(&self.to_u16()).finish()
  }
}
impl From<U16BE> for u16 {
  #[inline]
  fn from(value: U16BE) -> Self {
    value.to_u16()
  }
}

/// A `u32` stored as big-endian bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct U32BE([u8; 4]);
impl U32BE {
  /// Convert this value to a native `u32`
  #[inline]
  #[must_use]
  pub const fn to_u32(self) -> u32 {
    u32::from_be_bytes(self.0)
  }
  /// Make a value from a native `u32`
  #[inline]
  #[must_use]
  pub const fn from_u32(u: u32) -> Self {
    Self(u.to_be_bytes())
  }
}
impl core::fmt::Debug for U32BE {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("U32BE").field(&self.to_u32()).finish()
  }
}
impl From<U32BE> for u32 {
  #[inline]
  fn from(value: U32BE) -> Self {
    value.to_u32()
  }
}

/// Reads a `#[repr(C)]` record of big-endian fields out of chunk data.
///
/// Returns `None` unless `bytes` is exactly the size of `T`.
#[inline]
#[must_use]
pub(crate) fn pod_from_exact<T: Pod>(bytes: &[u8]) -> Option<T> {
  if bytes.len() == core::mem::size_of::<T>() {
    bytemuck::try_pod_read_unaligned(bytes).ok()
  } else {
    None
  }
}

#[test]
fn test_be_fields_read_unaligned() {
  #[derive(Clone, Copy, Pod, Zeroable)]
  #[repr(C)]
  struct Pair {
    a: U32BE,
    b: U16BE,
  }
  let bytes = [0xFF, 0, 0, 0, 1, 0, 2];
  let pair: Pair = pod_from_exact(&bytes[1..]).unwrap();
  assert_eq!(pair.a.to_u32(), 1);
  assert_eq!(pair.b.to_u16(), 2);
  assert_eq!((u32::from(pair.a), u16::from(pair.b)), (1, 2));
  assert!(pod_from_exact::<Pair>(&bytes).is_none());
}
