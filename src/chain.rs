use crate::block::Block;
use crate::error::{ChainError, Result};
use crate::hash::HashAlgorithm;
use crate::mining::{search_nonce, MiningConfig, MiningReport};
use crate::validation::{validate_blocks, ChainReport};
use chrono::Utc;
use tracing::{debug, warn};

/// An in-memory hash chain rooted at a fixed genesis block.
///
/// Validity is never stored; [`Chain::validate`] recomputes it from the
/// blocks each time. Mutations take `&mut self`, so a chain shared between
/// threads needs an external lock (one writer, or any number of readers).
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    algorithm: HashAlgorithm,
    earliest_tampered: Option<u64>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// A chain holding only the genesis block, hashed with SHA-256.
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::default())
    }

    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            blocks: vec![Block::genesis(algorithm)],
            algorithm,
            earliest_tampered: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: genesis is created with the chain and never removed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last(&self) -> &Block {
        // genesis guarantees at least one block
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Lowest tampered index not yet covered by a repair.
    pub fn earliest_tampered(&self) -> Option<u64> {
        self.earliest_tampered
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Append a block carrying `payload` on top of the current tail.
    pub fn add_block(&mut self, payload: impl Into<String>) -> &Block {
        let block = Block::next(self.last(), payload.into(), self.algorithm);
        debug!(index = block.index, digest = %block.digest, "appended block");
        self.blocks.push(block);
        self.last()
    }

    /// Mine the next block by searching for a nonce whose digest meets
    /// `config.difficulty`. Nothing is appended if the search runs out.
    pub fn mine_block(
        &mut self,
        payload: impl Into<String>,
        config: &MiningConfig,
    ) -> Result<MiningReport> {
        let previous = self.last();
        let mut candidate = Block::with_timestamp(
            previous.index + 1,
            Utc::now(),
            payload.into(),
            previous.digest.clone(),
            0,
            self.algorithm,
        );

        let attempts = match search_nonce(&mut candidate, config, self.algorithm) {
            Some(attempts) => attempts,
            None => {
                warn!(
                    index = candidate.index,
                    attempts = config.max_attempts,
                    difficulty = config.difficulty,
                    "mining limit reached"
                );
                return Err(ChainError::MiningExhausted {
                    attempts: config.max_attempts,
                });
            }
        };

        let report = MiningReport {
            index: candidate.index,
            nonce: candidate.nonce,
            attempts,
            difficulty: candidate.difficulty,
        };
        debug!(index = report.index, attempts, digest = %candidate.digest, "mined block");
        self.blocks.push(candidate);
        Ok(report)
    }

    /// Overwrite the payload of block `index` and recompute that block's
    /// digest only. Successors keep their now stale `previous_digest`.
    ///
    /// Genesis (index 0) and out-of-range indexes are rejected without change.
    pub fn tamper(&mut self, index: u64, new_payload: impl Into<String>) -> Result<()> {
        let pos = self.tamperable_position(index)?;
        let algorithm = self.algorithm;
        let block = &mut self.blocks[pos];
        block.payload = new_payload.into();
        block.digest = block.recompute_digest(algorithm);
        debug!(index, digest = %block.digest, "tampered block");
        self.earliest_tampered = Some(self.earliest_tampered.map_or(index, |t| t.min(index)));
        Ok(())
    }

    /// Re-link and re-hash every block from `from_index` to the tail.
    ///
    /// Blocks are processed left to right: each new digest is the
    /// `previous_digest` of the next block.
    pub fn repair(&mut self, from_index: u64) -> Result<()> {
        let start = self.tamperable_position(from_index)?;
        let algorithm = self.algorithm;
        for i in start..self.blocks.len() {
            let previous_digest = self.blocks[i - 1].digest.clone();
            let block = &mut self.blocks[i];
            block.previous_digest = previous_digest;
            block.digest = block.recompute_digest(algorithm);
        }
        debug!(
            from_index,
            relinked = self.blocks.len() - start,
            "repaired chain"
        );
        if self.earliest_tampered.is_some_and(|t| t >= from_index) {
            self.earliest_tampered = None;
        }
        Ok(())
    }

    /// Repair from the earliest unrepaired tampered block, or from block 1 when
    /// no tamper is recorded. Returns the number of blocks re-linked.
    pub fn repair_tampered(&mut self) -> usize {
        let from = self.earliest_tampered.unwrap_or(1);
        match self.repair(from) {
            Ok(()) => self.blocks.len() - from as usize,
            // only a genesis-only chain lands here
            Err(_) => 0,
        }
    }

    // ── Validation ────────────────────────────────────────────

    pub fn validate(&self) -> ChainReport {
        validate_blocks(&self.blocks, self.algorithm)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().valid
    }

    fn tamperable_position(&self, index: u64) -> Result<usize> {
        match usize::try_from(index) {
            Ok(pos) if pos >= 1 && pos < self.blocks.len() => Ok(pos),
            _ => {
                warn!(index, len = self.blocks.len(), "rejected block index");
                Err(ChainError::InvalidIndex {
                    index,
                    len: self.blocks.len(),
                })
            }
        }
    }
}
