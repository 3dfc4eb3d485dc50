//! Frame fingerprints for render regression checks.
//!
//! A headless run renders after every tick; hashing the last frame gives a compact,
//! comparable summary of what a seeded session drew.

use sha2::{Digest, Sha256};

pub fn rgba_sha256_hex(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    let digest = hasher.finalize();
    hex::encode(digest)
}
