//! Content hashing for media dedup.

use std::path::Path;

use sha2::{Digest, Sha256};

/// SHA-256 of a file's content, hex-encoded.
pub async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(sha256_bytes(&bytes))
}

/// SHA-256 of a byte slice, hex-encoded.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// File size in bytes.
pub async fn file_size(path: &Path) -> std::io::Result<u64> {
    Ok(tokio::fs::metadata(path).await?.len())
}
