// ABOUTME: OccurrenceKey, the fixed 32-byte digest that identifies an observed value.
// ABOUTME: Supports SHA-256 hashing of raw values and strict or lenient hex decoding.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of a key rendered as hex.
pub const KEY_HEX_LEN: usize = KEY_LEN * 2;

/// Errors that can occur when decoding a key from hex.
#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected 64 hex characters, got {0}")]
    WrongLength(usize),
}

/// A 32-byte content fingerprint, normally the SHA-256 digest of a value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OccurrenceKey([u8; KEY_LEN]);

impl OccurrenceKey {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Hash an arbitrary value with SHA-256.
    pub fn digest(value: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(value.as_ref()).into())
    }

    /// Strict decoding: exactly 64 hex characters in any case.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        if s.len() != KEY_HEX_LEN {
            return Err(KeyError::WrongLength(s.len()));
        }
        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(s.to_ascii_lowercase(), &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Lenient decoding: any valid hex string. The decoded bytes are copied
    /// into a zeroed key; a short input leaves trailing zero bytes and excess
    /// input is ignored.
    pub fn from_hex_prefix(s: &str) -> Result<Self, KeyError> {
        let decoded = hex::decode(s.to_ascii_lowercase())?;
        let mut bytes = [0u8; KEY_LEN];
        let n = decoded.len().min(KEY_LEN);
        bytes[..n].copy_from_slice(&decoded[..n]);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; KEY_LEN]> for OccurrenceKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OccurrenceKey({})", self.to_hex())
    }
}

// Hex in human-readable formats, raw bytes otherwise.
impl Serialize for OccurrenceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = OccurrenceKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{KEY_LEN} bytes or {KEY_HEX_LEN} hex characters")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        OccurrenceKey::from_hex(v).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        let bytes: [u8; KEY_LEN] = v
            .try_into()
            .map_err(|_| E::invalid_length(v.len(), &self))?;
        Ok(OccurrenceKey(bytes))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = [0u8; KEY_LEN];
        for (i, slot) in bytes.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(de::Error::invalid_length(KEY_LEN + 1, &self));
        }
        Ok(OccurrenceKey(bytes))
    }
}

impl<'de> Deserialize<'de> for OccurrenceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(KeyVisitor)
        } else {
            deserializer.deserialize_bytes(KeyVisitor)
        }
    }
}
