use crate::block::Block;
use crate::hash::HashAlgorithm;
use serde::Serialize;

/// Integrity of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockStatus {
    pub index: u64,
    /// Cached digest matches the fields.
    pub self_consistent: bool,
    /// `previous_digest` matches the predecessor's digest. Always true for genesis.
    pub linked: bool,
    /// Digest satisfies the block's mining difficulty. Informational, not part
    /// of validity.
    pub meets_target: bool,
}

impl BlockStatus {
    pub fn is_valid(&self) -> bool {
        self.self_consistent && self.linked
    }
}

/// Outcome of validating a whole chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub valid: bool,
    /// Lowest index whose block is not self-consistent or not linked.
    pub first_invalid_index: Option<u64>,
    pub blocks: Vec<BlockStatus>,
}

impl ChainReport {
    /// Indexes of every invalid block, ascending.
    pub fn invalid_indexes(&self) -> Vec<u64> {
        self.blocks
            .iter()
            .filter(|s| !s.is_valid())
            .map(|s| s.index)
            .collect()
    }
}

/// Check every block against its own fields and its predecessor.
pub fn validate_blocks(blocks: &[Block], algorithm: HashAlgorithm) -> ChainReport {
    let statuses: Vec<BlockStatus> = blocks
        .iter()
        .enumerate()
        .map(|(pos, block)| BlockStatus {
            index: block.index,
            self_consistent: block.is_self_consistent(algorithm),
            linked: pos == 0 || block.previous_digest == blocks[pos - 1].digest,
            meets_target: block.meets_difficulty(),
        })
        .collect();

    let first_invalid_index = statuses.iter().find(|s| !s.is_valid()).map(|s| s.index);

    ChainReport {
        valid: first_invalid_index.is_none(),
        first_invalid_index,
        blocks: statuses,
    }
}

impl std::fmt::Display for ChainReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.valid {
            writeln!(f, "Blockchain Valid ({} blocks)", self.blocks.len())?;
        } else {
            writeln!(f, "Blockchain Invalid ({} blocks)", self.blocks.len())?;
        }
        for status in &self.blocks {
            let verdict = if status.is_valid() { "Valid" } else { "Invalid" };
            let mut notes = Vec::new();
            if !status.self_consistent {
                notes.push("hash mismatch");
            }
            if !status.linked {
                notes.push("broken link");
            }
            if !status.meets_target {
                notes.push("below target");
            }
            if notes.is_empty() {
                writeln!(f, "  #{:<4} {}", status.index, verdict)?;
            } else {
                writeln!(f, "  #{:<4} {} ({})", status.index, verdict, notes.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blocks(algo: HashAlgorithm) -> Vec<Block> {
        let g = Block::genesis(algo);
        let a = Block::next(&g, "A".into(), algo);
        let b = Block::next(&a, "B".into(), algo);
        vec![g, a, b]
    }

    #[test]
    fn clean_blocks_validate() {
        let algo = HashAlgorithm::Sha256;
        let report = validate_blocks(&three_blocks(algo), algo);
        assert!(report.valid);
        assert_eq!(report.first_invalid_index, None);
        assert_eq!(report.blocks.len(), 3);
        assert!(report.invalid_indexes().is_empty());
    }

    #[test]
    fn stale_digest_is_flagged_on_the_block_itself() {
        let algo = HashAlgorithm::Sha256;
        let mut blocks = three_blocks(algo);
        blocks[1].payload = "edited".into();
        let report = validate_blocks(&blocks, algo);
        assert!(!report.valid);
        assert_eq!(report.first_invalid_index, Some(1));
        assert!(!report.blocks[1].self_consistent);
        // link of block 2 still points at the cached digest of block 1
        assert!(report.blocks[2].linked);
    }

    #[test]
    fn broken_link_is_flagged_on_the_successor() {
        let algo = HashAlgorithm::Checksum;
        let mut blocks = three_blocks(algo);
        blocks[1].payload = "edited".into();
        blocks[1].digest = blocks[1].recompute_digest(algo);
        let report = validate_blocks(&blocks, algo);
        assert!(report.blocks[1].is_valid());
        assert!(!report.blocks[2].linked);
        assert_eq!(report.first_invalid_index, Some(2));
        assert_eq!(report.invalid_indexes(), vec![2]);
    }

    #[test]
    fn display_mentions_failures() {
        let algo = HashAlgorithm::Sha256;
        let mut blocks = three_blocks(algo);
        blocks[2].previous_digest = "bogus".into();
        let text = validate_blocks(&blocks, algo).to_string();
        assert!(text.starts_with("Blockchain Invalid"));
        assert!(text.contains("broken link"));
    }
}
