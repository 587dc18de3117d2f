//! Codec for the `typehash` key carried in the user-data QoS field.
//!
//! The user-data string is a `;`-delimited `key=value;` list.
//! Only the well-known `typehash` key is interpreted here; other keys are
//! preserved by callers but ignored by this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hash bytes in a [`TypeHash`], matching rosidl's RIHS01
/// (SHA-256) digest size.
pub const TYPE_HASH_SIZE: usize = 32;

/// A structured, versioned type hash. `version == 0` means "unknown", the
/// zero-value sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHash {
  pub version: u8,
  pub value: [u8; TYPE_HASH_SIZE],
}

impl TypeHash {
  pub const UNSET: TypeHash = TypeHash {
    version: 0,
    value: [0u8; TYPE_HASH_SIZE],
  };

  pub fn is_set(&self) -> bool {
    self.version != 0
  }
}

impl Default for TypeHash {
  fn default() -> Self {
    TypeHash::UNSET
  }
}

impl fmt::Debug for TypeHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeHash({self})")
  }
}

impl fmt::Display for TypeHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "RIHS{:02}_", self.version)?;
    for byte in &self.value {
      write!(f, "{byte:02x}")?;
    }
    Ok(())
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeHashParseError {
  #[error("type hash string too short")]
  TooShort,
  #[error("type hash is missing the RIHS prefix")]
  MissingPrefix,
  #[error("type hash version field is not two decimal digits")]
  BadVersion,
  #[error("type hash digest is not {TYPE_HASH_SIZE} hex bytes")]
  BadDigest,
}

impl FromStr for TypeHash {
  type Err = TypeHashParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // "RIHS01_" + 64 hex chars
    if s.len() < 7 {
      return Err(TypeHashParseError::TooShort);
    }
    if &s[..4] != "RIHS" {
      return Err(TypeHashParseError::MissingPrefix);
    }
    let version: u8 = s[4..6]
      .parse()
      .map_err(|_| TypeHashParseError::BadVersion)?;
    let rest = s.get(6..).ok_or(TypeHashParseError::BadDigest)?;
    let rest = rest.strip_prefix('_').ok_or(TypeHashParseError::BadDigest)?;
    if rest.len() != TYPE_HASH_SIZE * 2 {
      return Err(TypeHashParseError::BadDigest);
    }
    let mut value = [0u8; TYPE_HASH_SIZE];
    for (i, chunk) in rest.as_bytes().chunks(2).enumerate() {
      let hex = std::str::from_utf8(chunk).map_err(|_| TypeHashParseError::BadDigest)?;
      value[i] = u8::from_str_radix(hex, 16).map_err(|_| TypeHashParseError::BadDigest)?;
    }
    Ok(TypeHash { version, value })
  }
}

/// Locate and parse the `typehash` key out of a user-data QoS byte
/// string. Absence of the key is not an error: it yields
/// [`TypeHash::UNSET`].
pub fn parse_type_hash_from_user_data(data: &[u8]) -> Result<TypeHash, TypeHashParseError> {
  let text = match std::str::from_utf8(data) {
    Ok(text) => text,
    Err(_) => return Ok(TypeHash::UNSET),
  };
  for pair in text.split(';') {
    let pair = pair.trim();
    if pair.is_empty() {
      continue;
    }
    if let Some((key, value)) = pair.split_once('=') {
      if key == "typehash" {
        return TypeHash::from_str(value);
      }
    }
  }
  Ok(TypeHash::UNSET)
}

/// Encode a type hash for inclusion in the user-data QoS field. An unset
/// hash encodes to the empty string (nothing to announce).
pub fn encode_type_hash_for_user_data_qos(hash: &TypeHash) -> String {
  if !hash.is_set() {
    String::new()
  } else {
    format!("typehash={hash};")
  }
}


#[cfg(test)]
mod proptests {
  use super::*;
  use proptest::prelude::*;

  proptest! {
    // parse(encode(h)) == h for any hash with a set version; an
    // unset-version hash always encodes to the empty string.
    #[test]
    fn round_trips_for_any_set_version_hash(
      version in 1u8..=99,
      value in prop::array::uniform32(any::<u8>()),
    ) {
      let hash = TypeHash { version, value };
      let encoded = encode_type_hash_for_user_data_qos(&hash);
      let user_data = format!("sentinel=1;{encoded}");
      let parsed = parse_type_hash_from_user_data(user_data.as_bytes()).unwrap();
      prop_assert_eq!(parsed, hash);
    }

    #[test]
    fn unset_version_encodes_to_empty_string(value in prop::array::uniform32(any::<u8>())) {
      let hash = TypeHash { version: 0, value };
      prop_assert_eq!(encode_type_hash_for_user_data_qos(&hash), "");
    }
  }
}
