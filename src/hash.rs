//! Hashing utilities shared by the primitives and validator layers.
//!
//! Grounded on the teacher's `crypto/keys.rs` (`hex::encode`/
//! `hex::decode`, sha2 usage), generalized from blake3 to the
//! double-SHA256 construction BCH-shaped chains use for block and
//! transaction ids.

use sha2::{Digest, Sha256};

pub type Hash32 = [u8; 32];

pub const ZERO_HASH: Hash32 = [0u8; 32];

/// Double SHA-256, Bitcoin/BCH-style.
pub fn sha256d(data: &[u8]) -> Hash32 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

pub fn hash_to_hex(h: &Hash32) -> String {
    hex::encode(h)
}

pub fn hash_from_hex(s: &str) -> Option<Hash32> {
    let bytes = hex::decode(s).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Some(out)
}

/// Merkle root over a leaf-hash list using Bitcoin's duplicate-last-on-odd
/// rule. Grounded on the teacher's `Block::calculate_merkle_root`.
pub fn merkle_root(leaves: &[Hash32]) -> Hash32 {
    if leaves.is_empty() {
        return ZERO_HASH;
    }
    let mut level: Vec<Hash32> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for chunk in level.chunks(2) {
            let mut combined = Vec::with_capacity(64);
            combined.extend_from_slice(&chunk[0]);
            if chunk.len() > 1 {
                combined.extend_from_slice(&chunk[1]);
            } else {
                combined.extend_from_slice(&chunk[0]);
            }
            next.push(sha256d(&combined));
        }
        level = next;
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_round_trip() {
        let hash = sha256d(b"round-trip");
        let hex = hash_to_hex(&hash);
        assert_eq!(hash_from_hex(&hex).unwrap(), hash);
    }

    #[test]
    fn merkle_root_empty_is_zero() {
        assert_eq!(merkle_root(&[]), ZERO_HASH);
    }

    #[test]
    fn merkle_root_single_leaf_is_itself() {
        let leaf = sha256d(b"leaf");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn merkle_root_odd_count_duplicates_last() {
        let a = sha256d(b"a");
        let b = sha256d(b"b");
        let c = sha256d(b"c");
        let root_three = merkle_root(&[a, b, c]);
        let root_four = merkle_root(&[a, b, c, c]);
        assert_eq!(root_three, root_four);
    }

    #[test]
    fn sha256d_is_deterministic() {
        assert_eq!(sha256d(b"x"), sha256d(b"x"));
        assert_ne!(sha256d(b"x"), sha256d(b"y"));
    }
}
