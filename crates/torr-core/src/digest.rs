//! Content digests.
//!
//! Files and chunks are addressed by a 128-bit digest: the first 16 bytes of
//! the BLAKE3 hash of their bytes. The digest is a lookup key. Nothing in the
//! node treats it as proof that a peer sent the right bytes.

/// Digest length in bytes. Requests carrying a hash of any other length are
/// rejected before touching the store.
pub const DIGEST_LEN: usize = 16;

/// A 128-bit content digest.
pub type Digest = [u8; DIGEST_LEN];

/// Digest a byte slice.
pub fn digest(data: &[u8]) -> Digest {
    let full = blake3::hash(data);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&full.as_bytes()[..DIGEST_LEN]);
    out
}

/// Interpret wire bytes as a digest. `None` unless exactly `DIGEST_LEN` long.
pub fn parse_digest(bytes: &[u8]) -> Option<Digest> {
    bytes.try_into().ok()
}
