//! Content digests used for cache keys.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 over the concatenation of `parts`.
///
/// Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn sha256_hex<I, P>(parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        let bytes = part.as_ref();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    hex::encode(hasher.finalize())
}
