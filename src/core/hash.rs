//! Commit Digest
//!
//! Folds every committed sprite change into a SHA-256 digest so two runs of
//! the same scripted match can be compared byte for byte.
//! Order of updates is significant.

use sha2::{Digest, Sha256};
use super::vec2::Vec2;

/// Hash output type (256 bits / 32 bytes)
pub type CommitDigest = [u8; 32];

/// Incremental hasher over committed state.
#[derive(Clone)]
pub struct CommitHasher {
    hasher: Sha256,
    commits: u64,
}

impl CommitHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher, commits: 0 }
    }

    /// Create hasher for a match commit log.
    pub fn for_match() -> Self {
        Self::new(b"DUEL_COMMITS_V1")
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f32 by its bit pattern.
    #[inline]
    pub fn update_f32(&mut self, value: f32) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a vector.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f32(value.x);
        self.update_f32(value.y);
    }

    /// Update with a length-prefixed string.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.hasher.update([value as u8]);
    }

    /// Mark the end of one commit record.
    pub fn end_commit(&mut self) {
        self.commits += 1;
    }

    /// Number of commit records folded so far.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> CommitDigest {
        let mut hasher = self.hasher;
        hasher.update(self.commits.to_le_bytes());
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_hasher_determinism() {
        let make_hash = || {
            let mut hasher = CommitHasher::for_match();
            hasher.update_str("player1");
            hasher.update_vec2(Vec2::new(101.2, 200.0));
            hasher.update_f32(0.0);
            hasher.update_bool(true);
            hasher.end_commit();
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = CommitHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = CommitHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_prefix_prevents_ambiguity() {
        let hash1 = {
            let mut h = CommitHasher::for_match();
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };
        let hash2 = {
            let mut h = CommitHasher::for_match();
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_commit_count() {
        let mut h = CommitHasher::for_match();
        h.end_commit();
        h.end_commit();
        assert_eq!(h.commit_count(), 2);
    }
}
