use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid block index {index} (chain length {len})")]
    InvalidIndex { index: u64, len: usize },

    #[error("Mining gave up after {attempts} attempts without meeting the target")]
    MiningExhausted { attempts: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Bad command: {0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
