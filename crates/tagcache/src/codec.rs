//! Payload encoding.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tagcache_core::{Result, TagCacheError};

/// Turns values into stored payloads and back.
pub trait Codec: Send + Sync {
    /// Serializes a value for storage.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Restores a value from a stored payload.
    ///
    /// Any malformed payload must yield `TagCacheError::Decode`.
    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T>;
}

/// JSON payloads, zlib-compressed by default.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    compression: Option<Compression>,
}

impl JsonCodec {
    /// JSON with zlib at the default level (6).
    pub fn new() -> Self {
        Self {
            compression: Some(Compression::default()),
        }
    }

    /// JSON with zlib at the given level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            compression: Some(Compression::new(level.min(9))),
        }
    }

    /// Plain JSON, readable with any store client.
    pub fn uncompressed() -> Self {
        Self { compression: None }
    }

    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(value).map_err(|e| TagCacheError::encode(e.to_string()))?;

        let Some(level) = self.compression else {
            return Ok(json);
        };

        let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), level);
        encoder
            .write_all(&json)
            .map_err(|e| TagCacheError::encode(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| TagCacheError::encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        if self.compression.is_none() {
            return serde_json::from_slice(payload).map_err(|e| TagCacheError::decode(e.to_string()));
        }

        let mut json = Vec::new();
        ZlibDecoder::new(payload)
            .read_to_end(&mut json)
            .map_err(|e| TagCacheError::decode(format!("zlib: {}", e)))?;
        serde_json::from_slice(&json).map_err(|e| TagCacheError::decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u64,
        name: String,
        roles: Vec<String>,
    }

    fn profile() -> Profile {
        Profile {
            id: 42,
            name: "Ada".to_string(),
            roles: vec!["admin".to_string(), "ops".to_string()],
        }
    }

    #[test]
    fn test_compressed_payload_is_zlib() {
        let payload = JsonCodec::new().encode(&profile()).unwrap();

        // zlib header: deflate, 32K window.
        assert_eq!(payload[0], 0x78);
        let back: Profile = JsonCodec::new().decode(&payload).unwrap();
        assert_eq!(back, profile());
    }

    #[test]
    fn test_uncompressed_payload_is_json() {
        let codec = JsonCodec::uncompressed();
        let payload = codec.encode(&profile()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["name"], "Ada");
        assert!(!codec.is_compressed());
    }

    #[test]
    fn test_encode_unsized_str() {
        let codec = JsonCodec::new();
        let payload = codec.encode("v1").unwrap();
        let back: String = codec.decode(&payload).unwrap();
        assert_eq!(back, "v1");
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = JsonCodec::new()
            .decode::<Profile>(b"definitely not zlib")
            .unwrap_err();
        assert!(err.is_decode_failure());

        let err = JsonCodec::uncompressed()
            .decode::<Profile>(b"{\"id\":")
            .unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_shape_mismatch_is_decode_error() {
        let codec = JsonCodec::new();
        let payload = codec.encode(&vec![1, 2, 3]).unwrap();

        let err = codec.decode::<Profile>(&payload).unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_levels_agree() {
        let fast = JsonCodec::with_level(1).encode(&profile()).unwrap();
        let back: Profile = JsonCodec::with_level(9).decode(&fast).unwrap();
        assert_eq!(back, profile());
    }
}
