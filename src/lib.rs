// hashledger
// Hash-linked ledger with proof-of-work mining and tamper/balance audits

pub mod core;
pub mod consensus;
pub mod ledger;
pub mod wallet;
pub mod cli;

// Re-exports for convenience
pub use crate::core::{
    AppendBlock, Block, BlockData, Chain, ChainView, Hash256, MineableBlock, Transaction,
    block_hash,
};
pub use crate::consensus::{
    MAX_DIFFICULTY, Miner, MinerConfig, MiningResult, ValidationError, valid_hash,
    is_valid_transaction, is_valid_block, is_valid_chain, is_valid_mineable_chain,
};
pub use crate::ledger::{LedgerConfig, LedgerError, MineableChain};
pub use crate::wallet::{Address, KeyPair, Keystore};
pub use crate::cli::{Cli, CliHandler, Commands};
