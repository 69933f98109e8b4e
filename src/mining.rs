use crate::block::{meets_target, Block};
use crate::hash::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Proof-of-work settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Required number of leading `'0'` hex characters.
    pub difficulty: u32,
    /// Give up after this many nonces.
    pub max_attempts: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: 3,
            max_attempts: 1000,
        }
    }
}

/// Result of a successful mining run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningReport {
    pub index: u64,
    pub nonce: u64,
    pub attempts: u64,
    pub difficulty: u32,
}

impl std::fmt::Display for MiningReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mined block #{} after {} attempt(s) (nonce {}, difficulty {})",
            self.index, self.attempts, self.nonce, self.difficulty
        )
    }
}

/// Try nonces `1..=max_attempts` on `candidate` until its digest meets the
/// target. On success the candidate carries the winning nonce, digest and
/// difficulty, and the attempt count is returned. On failure the candidate is
/// left as it was.
pub fn search_nonce(
    candidate: &mut Block,
    config: &MiningConfig,
    algorithm: HashAlgorithm,
) -> Option<u64> {
    for nonce in 1..=config.max_attempts {
        let digest = algorithm.digest(
            candidate.index,
            &candidate.timestamp,
            &candidate.payload,
            &candidate.previous_digest,
            nonce,
        );
        if meets_target(&digest, config.difficulty) {
            candidate.nonce = nonce;
            candidate.digest = digest;
            candidate.difficulty = config.difficulty;
            return Some(nonce);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(algo: HashAlgorithm) -> Block {
        let g = Block::genesis(algo);
        Block::with_timestamp(1, Utc::now(), "tx".into(), g.digest, 0, algo)
    }

    #[test]
    fn zero_difficulty_first_nonce_wins() {
        let algo = HashAlgorithm::Sha256;
        let mut b = candidate(algo);
        let cfg = MiningConfig {
            difficulty: 0,
            max_attempts: 10,
        };
        assert_eq!(search_nonce(&mut b, &cfg, algo), Some(1));
        assert_eq!(b.nonce, 1);
        assert!(b.is_self_consistent(algo));
    }

    #[test]
    fn found_nonce_meets_target() {
        let algo = HashAlgorithm::Sha256;
        let mut b = candidate(algo);
        let cfg = MiningConfig {
            difficulty: 1,
            max_attempts: 10_000,
        };
        let attempts = search_nonce(&mut b, &cfg, algo).expect("1 zero is found quickly");
        assert_eq!(attempts, b.nonce);
        assert_eq!(b.difficulty, 1);
        assert!(b.meets_difficulty());
        assert!(b.is_self_consistent(algo));
    }

    #[test]
    fn exhaustion_leaves_candidate_untouched() {
        let algo = HashAlgorithm::Sha256;
        let mut b = candidate(algo);
        let before = b.clone();
        let cfg = MiningConfig {
            difficulty: 64,
            max_attempts: 50,
        };
        assert_eq!(search_nonce(&mut b, &cfg, algo), None);
        assert_eq!(b, before);
    }

    #[test]
    fn defaults_match_classic_demo() {
        let cfg = MiningConfig::default();
        assert_eq!(cfg.difficulty, 3);
        assert_eq!(cfg.max_attempts, 1000);
    }
}
