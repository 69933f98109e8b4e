//! Hash-chain integrity simulator.
//!
//! Build a chain of content-addressed blocks, tamper with one, watch the
//! links after it break, then repair them.

pub mod block;
pub mod chain;
pub mod config;
pub mod error;
pub mod hash;
pub mod mining;
pub mod session;
pub mod validation;

pub use block::Block;
pub use chain::Chain;
pub use config::SimulatorConfig;
pub use error::{ChainError, Result};
pub use hash::{BlockHash, HashAlgorithm};
pub use mining::{MiningConfig, MiningReport};
pub use validation::{BlockStatus, ChainReport};
