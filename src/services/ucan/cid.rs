//! Content identifiers for encoded tokens (the revocation key).
use ipld_core::cid::Cid;
use ipld_core::cid::multihash::Multihash;
use sha2::{Digest, Sha256};

/// Multicodec code of the `raw` codec.
const RAW: u64 = 0x55;
/// Multihash code of sha2-256.
const SHA2_256: u64 = 0x12;

/// CIDv1 (raw, sha2-256) of the given bytes, rendered as base32.
///
/// Callers hash the token exactly as it was presented, so the result matches what a
/// revoker computed from the same string.
pub fn identify(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    // A 32-byte digest always fits the 64-byte multihash.
    match Multihash::<64>::wrap(SHA2_256, &digest) {
        Ok(hash) => Cid::new_v1(RAW, hash).to_string(),
        Err(_) => unreachable!("sha2-256 digest exceeds multihash capacity"),
    }
}
