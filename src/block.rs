use crate::hash::{format_timestamp, BlockHash, HashAlgorithm, DIGEST_WIDTH};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// Payload carried by the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// Nonce of the genesis block.
pub const GENESIS_NONCE: u64 = 12345;

/// Upper bound (exclusive) for randomly assigned nonces.
pub const NONCE_RANGE: u64 = 1_000_000;

/// `previous_digest` of the genesis block: 64 zeros.
pub fn genesis_sentinel() -> BlockHash {
    "0".repeat(DIGEST_WIDTH)
}

/// One link of the chain.
///
/// Fields are public for reading. Only [`crate::chain::Chain`] mutates blocks
/// it owns, and it hands out `&Block` only.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// User data. Changed only by tampering.
    pub payload: String,
    /// Digest of the block at `index - 1`.
    pub previous_digest: BlockHash,
    /// Value mixed into the digest.
    pub nonce: u64,
    /// Cached digest over all fields above.
    pub digest: BlockHash,
    /// Leading zero hex characters the digest had to have when mined.
    pub difficulty: u32,
}

impl Block {
    /// The fixed genesis block. Identical across runs for a given algorithm.
    pub fn genesis(algorithm: HashAlgorithm) -> Self {
        let timestamp = Utc
            .with_ymd_and_hms(2009, 1, 3, 18, 15, 5)
            .single()
            .unwrap_or_default();
        Self::with_timestamp(
            0,
            timestamp,
            GENESIS_PAYLOAD.into(),
            genesis_sentinel(),
            GENESIS_NONCE,
            algorithm,
        )
    }

    /// Build the successor of `previous` with the current time and a random nonce.
    pub fn next(previous: &Block, payload: String, algorithm: HashAlgorithm) -> Self {
        let nonce = rand::thread_rng().gen_range(0..NONCE_RANGE);
        Self::with_timestamp(
            previous.index + 1,
            Utc::now(),
            payload,
            previous.digest.clone(),
            nonce,
            algorithm,
        )
    }

    /// Create a block with an explicit timestamp and nonce (for testing / mining).
    pub fn with_timestamp(
        index: u64,
        timestamp: DateTime<Utc>,
        payload: String,
        previous_digest: BlockHash,
        nonce: u64,
        algorithm: HashAlgorithm,
    ) -> Self {
        let digest = algorithm.digest(index, &timestamp, &payload, &previous_digest, nonce);
        Self {
            index,
            timestamp,
            payload,
            previous_digest,
            nonce,
            digest,
            difficulty: 0,
        }
    }

    /// Digest of the block's current fields. Does not touch `self.digest`.
    pub fn recompute_digest(&self, algorithm: HashAlgorithm) -> BlockHash {
        algorithm.digest(
            self.index,
            &self.timestamp,
            &self.payload,
            &self.previous_digest,
            self.nonce,
        )
    }

    /// Whether the cached digest still matches the fields.
    pub fn is_self_consistent(&self, algorithm: HashAlgorithm) -> bool {
        self.digest == self.recompute_digest(algorithm)
    }

    /// Whether the digest has at least `difficulty` leading zeros.
    pub fn meets_difficulty(&self) -> bool {
        meets_target(&self.digest, self.difficulty)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

/// `true` if `digest` starts with `difficulty` `'0'` characters.
pub fn meets_target(digest: &str, difficulty: u32) -> bool {
    let needed = difficulty as usize;
    digest.len() >= needed && digest.bytes().take(needed).all(|b| b == b'0')
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "  Timestamp:     {}", format_timestamp(&self.timestamp))?;
        writeln!(f, "  Data:          {}", self.payload)?;
        writeln!(f, "  Previous Hash: {}", self.previous_digest)?;
        writeln!(f, "  Hash:          {}", self.digest)?;
        writeln!(f, "  Nonce:         {}", self.nonce)?;
        if self.difficulty > 0 {
            writeln!(f, "  Difficulty:    {}", self.difficulty)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_reproducible() {
        for algo in [HashAlgorithm::Sha256, HashAlgorithm::Checksum] {
            let g1 = Block::genesis(algo);
            let g2 = Block::genesis(algo);
            assert_eq!(g1, g2);
            assert_eq!(g1.index, 0);
            assert_eq!(g1.payload, GENESIS_PAYLOAD);
            assert_eq!(g1.previous_digest, genesis_sentinel());
            assert!(g1.is_self_consistent(algo));
        }
    }

    #[test]
    fn next_links_to_previous() {
        let algo = HashAlgorithm::Sha256;
        let g = Block::genesis(algo);
        let b = Block::next(&g, "A".into(), algo);
        assert_eq!(b.index, 1);
        assert_eq!(b.previous_digest, g.digest);
        assert!(b.nonce < NONCE_RANGE);
        assert!(b.is_self_consistent(algo));
    }

    #[test]
    fn edited_payload_breaks_self_consistency() {
        let algo = HashAlgorithm::Checksum;
        let g = Block::genesis(algo);
        let mut b = Block::next(&g, "original".into(), algo);
        b.payload = "tampered".into();
        assert!(!b.is_self_consistent(algo));
        // recompute does not write back
        let fresh = b.recompute_digest(algo);
        assert_ne!(fresh, b.digest);
    }

    #[test]
    fn consistency_depends_on_algorithm() {
        let g = Block::genesis(HashAlgorithm::Sha256);
        assert!(!g.is_self_consistent(HashAlgorithm::Checksum));
    }

    #[test]
    fn difficulty_target() {
        assert!(meets_target("000abc", 3));
        assert!(!meets_target("00fabc", 3));
        assert!(meets_target("fff", 0));
        assert!(!meets_target("00", 3));
    }

    #[test]
    fn display_shows_card_fields() {
        let g = Block::genesis(HashAlgorithm::Sha256);
        let text = g.to_string();
        assert!(text.starts_with("Block #0"));
        assert!(text.contains("Genesis Block"));
        assert!(text.contains("2009-01-03T18:15:05.000Z"));
        assert!(text.contains(&g.digest));
        assert!(!text.contains("Difficulty"));
    }
}
