use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::Path;

pub fn checksum_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Digest for file finalization metadata.
pub fn file_checksum(path: &Path) -> std::io::Result<String> {
    Ok(checksum_hex(&std::fs::read(path)?))
}
