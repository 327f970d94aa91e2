//! Binary envelope for memoized catalog payloads.
//!
//! The response cache stores typed payloads, not raw JSON, so a hit skips
//! parsing entirely. Every entry is framed as:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "PKDX"              u32                postcard::to_allocvec(T)
//! ```
//!
//! Payload types must be postcard-friendly: no `skip_serializing_if`, no
//! untagged enums, no `serde_json::Value`.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header of every cached payload.
pub const PAYLOAD_MAGIC: [u8; 4] = *b"PKDX";

/// Bump when a cached model struct changes shape.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PayloadEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> PayloadEnvelope<T> {
    pub fn new(payload: T) -> Self {
        PayloadEnvelope {
            magic: PAYLOAD_MAGIC,
            version: PAYLOAD_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Frame `value` for storage in a [`CacheBackend`](crate::backend::CacheBackend).
///
/// # Errors
/// Returns `Error::Serialization` if postcard cannot encode the value.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(&PayloadEnvelope::new(value)).map_err(|e| {
        error!("Payload serialization failed: {}", e);
        Error::Serialization(e.to_string())
    })
}

/// Decode bytes written by [`encode_payload`].
///
/// # Errors
///
/// - `Error::Deserialization`: truncated or corrupted bytes
/// - `Error::InvalidCacheEntry`: magic header is not `PKDX`
/// - `Error::VersionMismatch`: written by another schema version
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: PayloadEnvelope<T> = postcard::from_bytes(bytes)?;

    if envelope.magic != PAYLOAD_MAGIC {
        warn!("Rejecting cache entry with magic {:?}", envelope.magic);
        return Err(Error::InvalidCacheEntry(format!(
            "expected magic {:?}, got {:?}",
            PAYLOAD_MAGIC, envelope.magic
        )));
    }

    if envelope.version != PAYLOAD_SCHEMA_VERSION {
        warn!(
            "Rejecting cache entry with schema version {} (current {})",
            envelope.version, PAYLOAD_SCHEMA_VERSION
        );
        return Err(Error::VersionMismatch {
            expected: PAYLOAD_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NamedResource, PokemonListResponse};

    fn page() -> PokemonListResponse {
        PokemonListResponse {
            count: 1302,
            next: Some("https://pokeapi.co/api/v2/pokemon?offset=20&limit=20".to_string()),
            previous: None,
            results: vec![NamedResource::new(
                "bulbasaur",
                "https://pokeapi.co/api/v2/pokemon/1/",
            )],
        }
    }

    #[test]
    fn test_list_page_survives_envelope() {
        let bytes = encode_payload(&page()).unwrap();
        let decoded: PokemonListResponse = decode_payload(&bytes).unwrap();
        assert_eq!(decoded, page());
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let mut envelope = PayloadEnvelope::new(page());
        envelope.magic = *b"CKIT";
        let bytes = postcard::to_allocvec(&envelope).unwrap();

        match decode_payload::<PokemonListResponse>(&bytes) {
            Err(Error::InvalidCacheEntry(_)) => {}
            other => panic!("Expected InvalidCacheEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_old_schema_rejected() {
        let mut envelope = PayloadEnvelope::new(page());
        envelope.version = PAYLOAD_SCHEMA_VERSION + 1;
        let bytes = postcard::to_allocvec(&envelope).unwrap();

        match decode_payload::<PokemonListResponse>(&bytes) {
            Err(Error::VersionMismatch { expected, found }) => {
                assert_eq!(expected, PAYLOAD_SCHEMA_VERSION);
                assert_eq!(found, PAYLOAD_SCHEMA_VERSION + 1);
            }
            other => panic!("Expected VersionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let mut bytes = encode_payload(&page()).unwrap();
        bytes.truncate(bytes.len() / 2);

        assert!(matches!(
            decode_payload::<PokemonListResponse>(&bytes),
            Err(Error::Deserialization(_))
        ));
    }
}
