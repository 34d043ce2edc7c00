//! Content-based hashing for cache keys

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 based content hash.
///
/// Used to key compiled shader permutations and cached payloads, so two
/// structurally equal define sets always map to the same entry.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        Self(result.into())
    }

    /// Compute a hash over a sequence of string parts.
    ///
    /// Parts are length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// Get the hash as a hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the hash as a prefixed hex string (e.g., "sha256:abcdef...")
    pub fn to_prefixed_hex(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }

    /// Short form for log lines
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefixed_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_same_hash() {
        let h1 = ContentHash::from_bytes(b"ENABLE_IBL");
        let h2 = ContentHash::from_bytes(b"ENABLE_IBL");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_content_different_hash() {
        let h1 = ContentHash::from_bytes(b"DIFFUSE_LAMBERT");
        let h2 = ContentHash::from_bytes(b"DIFFUSE_BURLEY");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_parts_are_length_prefixed() {
        let h1 = ContentHash::from_parts(["ab", "c"]);
        let h2 = ContentHash::from_parts(["a", "bc"]);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_prefixed_hex() {
        let hash = ContentHash::from_bytes(b"test");
        let prefixed = hash.to_prefixed_hex();
        assert!(prefixed.starts_with("sha256:"));
        assert_eq!(prefixed.len(), 7 + 64);
        assert_eq!(hash.short().len(), 12);
    }
}
