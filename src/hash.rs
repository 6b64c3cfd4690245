//! Content-addressed file identity.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A file's path, content hash, and size. `hash` is the first 10 hex
/// characters of the SHA-256 of the file contents — short enough to read,
/// long enough that accidental collisions across a real corpus are not a
/// concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDescriptor {
    #[serde(rename = "InPath")]
    pub in_path: PathBuf,
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "SizeMB")]
    pub size_bytes: u64,
}

/// Length of the hash prefix kept from the full SHA-256 digest.
pub const HASH_LEN: usize = 10;

pub fn hash_path(path: &Path) -> Result<(String, u64)> {
    let mut file = std::fs::File::open(path)?;
    hash_reader(&mut file)
}

pub fn hash_reader<R: Read>(reader: &mut R) -> Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    let digest = hasher.finalize();
    let full_hex = hex_encode(&digest);
    Ok((full_hex[..HASH_LEN].to_string(), total))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 0x0f) as usize] as char);
    }
    s
}
