use crate::error::ChainError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Lowercase hex digest, 64 characters wide.
pub type BlockHash = String;

/// Width of every digest produced by [`HashAlgorithm::digest`].
pub const DIGEST_WIDTH: usize = 64;

/// Digest algorithm a chain uses for all of its blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 over the block preimage.
    #[default]
    Sha256,
    /// 32-bit shift-and-subtract checksum, zero-padded to 64 hex characters.
    /// Illustrative only: collisions are easy to find.
    Checksum,
}

impl HashAlgorithm {
    /// Digest of a block's fields. Pure and total.
    pub fn digest(
        self,
        index: u64,
        timestamp: &DateTime<Utc>,
        payload: &str,
        previous_digest: &str,
        nonce: u64,
    ) -> BlockHash {
        let preimage = preimage(index, timestamp, payload, previous_digest, nonce);
        match self {
            HashAlgorithm::Sha256 => compute_hash(preimage.as_bytes()),
            HashAlgorithm::Checksum => checksum(&preimage),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Checksum => write!(f, "checksum"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "checksum" => Ok(HashAlgorithm::Checksum),
            other => Err(ChainError::Command(format!("unknown hash algorithm: {}", other))),
        }
    }
}

/// Compute the SHA-256 hex digest of some data.
pub fn compute_hash(data: &[u8]) -> BlockHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Render a timestamp the way it enters the preimage: RFC 3339, millisecond
/// precision, `Z` suffix.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn preimage(
    index: u64,
    timestamp: &DateTime<Utc>,
    payload: &str,
    previous_digest: &str,
    nonce: u64,
) -> String {
    format!(
        "{}{}{}{}{}",
        index,
        format_timestamp(timestamp),
        payload,
        previous_digest,
        nonce
    )
}

/// `h = h * 31 + c` over UTF-16 code units with 32-bit wraparound.
fn checksum(input: &str) -> BlockHash {
    let mut h: i32 = 0;
    for unit in input.encode_utf16() {
        h = (h << 5).wrapping_sub(h).wrapping_add(unit as i32);
    }
    format!("{:0>width$x}", h.unsigned_abs(), width = DIGEST_WIDTH)
}
