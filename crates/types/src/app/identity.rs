// Path: crates/types/src/app/identity.rs

use super::{keccak256, H160};
use parity_scale_codec::{Decode, Encode};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An Ethereum-style 20-byte account address.
pub type Address = H160;

macro_rules! hash32_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode, Decode)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Returns the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Parses a 64-character hex string, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, String> {
                let raw = hex::decode(s.trim_start_matches("0x")).map_err(|e| e.to_string())?;
                let bytes: [u8; 32] = raw
                    .try_into()
                    .map_err(|v: Vec<u8>| format!("expected 32 bytes, got {}", v.len()))?;
                Ok(Self(bytes))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let short = self.0.get(..4).map(hex::encode).unwrap_or_default();
                write!(f, "{}({}..)", stringify!($name), short)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(D::Error::custom)
            }
        }
    };
}

hash32_newtype!(
    /// The identity of a DAG participant: the creator of events and the originator of
    /// transactions. Only equality and hashing carry meaning; the derived order exists
    /// so that deterministic maps can key on it.
    ValidatorId
);

hash32_newtype!(
    /// The content hash of a DAG event.
    EventHash
);

impl ValidatorId {
    /// Derives a validator identity from its public key material.
    pub fn from_key_material(public_key: &[u8]) -> Self {
        Self(keccak256(public_key).0)
    }
}

/// Derives the account address controlled by an uncompressed secp256k1 public key
/// (64 bytes, without the `0x04` tag): the last 20 bytes of its Keccak-256 digest.
pub fn address_from_public_key(public_key: &[u8; 64]) -> Address {
    Address::from(keccak256(public_key))
}
