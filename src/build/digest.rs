// src/build/digest.rs

//! Content digests for built bundles.

use std::fmt;
use std::str::FromStr;

use blake3::Hasher;

/// Full-width BLAKE3 digest of a bundle's final bytes.
///
/// Doubles as the bundle's cache key and, quoted, as its ETag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; blake3::OUT_LEN]);

impl Digest {
    /// Digest `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(bytes);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; blake3::OUT_LEN] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    /// Strong entity tag: the hex digest in double quotes.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "Digest({})", &self.to_hex()[..12])
    }
}

impl FromStr for Digest {
    type Err = String;

    /// Accepts the bare hex form or a quoted ETag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_matches('"');
        blake3::Hash::from_hex(hex)
            .map(|h| Self(*h.as_bytes()))
            .map_err(|e| format!("invalid digest {s:?}: {e}"))
    }
}
