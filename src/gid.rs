//! Globally unique endpoint identifier.
//!
//! See [Gid](https://github.com/ros2/rmw_dds_common/blob/master/rmw_dds_common/msg/Gid.msg)
//! in ROS2. The storage size is an ABI constant, not tied to any one DDS
//! vendor's native GUID layout.

use std::fmt;

use cdr_encoding_size::CdrEncodingSize;
use serde::{Deserialize, Serialize};

/// ABI-defined storage size for a [`Gid`], in bytes.
pub const GID_STORAGE_SIZE: usize = 24;

/// Globally unique opaque endpoint identifier.
///
/// Equality is byte-wise, ordering is lexicographic over the bytes -- this
/// makes `Gid` cheap to use as a `BTreeMap` key, which the cache relies on
/// for deterministic iteration order.
#[derive(
  Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, CdrEncodingSize,
)]
pub struct Gid {
  data: [u8; GID_STORAGE_SIZE],
}

impl Gid {
  /// The all-zero Gid. Used as a placeholder, never a real identity.
  pub const ZERO: Gid = Gid {
    data: [0u8; GID_STORAGE_SIZE],
  };

  /// Build a Gid from its raw wire bytes.
  pub fn from_bytes(data: [u8; GID_STORAGE_SIZE]) -> Gid {
    Gid { data }
  }

  /// Borrow the raw wire bytes -- conversion to the wire form is a straight
  /// memory copy of this slice.
  pub fn as_bytes(&self) -> &[u8; GID_STORAGE_SIZE] {
    &self.data
  }

  /// Build a Gid from a vendor-native identifier, via the [`NativeGuid`]
  /// adapter the hosting middleware provides for its own GUID type.
  pub fn from_native<G: NativeGuid>(guid: &G) -> Gid {
    let mut data = [0u8; GID_STORAGE_SIZE];
    data[..12].copy_from_slice(&guid.guid_prefix());
    data[12..16].copy_from_slice(&guid.entity_id());
    Gid { data }
  }

  pub fn is_zero(&self) -> bool {
    self.data == [0u8; GID_STORAGE_SIZE]
  }
}

impl fmt::Debug for Gid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Gid(")?;
    for b in &self.data {
      write!(f, "{b:02x}")?;
    }
    write!(f, ")")
  }
}

impl fmt::Display for Gid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

impl Default for Gid {
  fn default() -> Self {
    Gid::ZERO
  }
}

/// Adapter a vendor DDS SDK implements over its own native GUID type so
/// this crate never has to depend on any one vendor's representation.
///
/// `guid_prefix` identifies the owning participant; `entity_id` identifies
/// the endpoint within that participant. Concatenated they form the first
/// 16 bytes of the Gid; the remaining bytes are reserved and zero.
pub trait NativeGuid {
  fn guid_prefix(&self) -> [u8; 12];
  fn entity_id(&self) -> [u8; 4];
}
