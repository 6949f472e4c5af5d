//! Hashing primitives for EmberChain
//!
//! A single deterministic digest function stands in for both block hashing
//! and transaction "signing" in this simulation. Digests are fixed-length
//! lowercase hex strings; equality is byte-exact.

use sha2::{Digest as Sha2Digest, Sha256};

/// Hex length of every digest produced by [`digest`].
pub const DIGEST_LEN: usize = 64;

/// Compute the SHA-256 digest of arbitrary bytes, hex-encoded.
pub fn digest(input: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(input.as_ref()))
}

/// Reduce an ordered sequence of digests to a single Merkle root.
///
/// An empty sequence yields the digest of the empty input. A single element
/// is hashed once more rather than returned unchanged; that extra pass is
/// part of the wire-compatible definition. For longer sequences, each level
/// concatenates and hashes adjacent pairs, duplicating a trailing odd
/// element, until one digest remains.
pub fn merkle_root(leaves: &[String]) -> String {
    if leaves.is_empty() {
        return digest("");
    }
    if leaves.len() == 1 {
        return digest(&leaves[0]);
    }

    let mut level: Vec<String> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let right = pair.get(1).unwrap_or(&pair[0]);
            next.push(digest(format!("{}{}", pair[0], right)));
        }
        level = next;
    }
    level.remove(0)
}

/// Proof-of-work predicate: does `hash` start with `difficulty` zero
/// hex characters? Difficulty is a digit count, not a numeric target.
pub fn satisfies_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
