// Consensus and validation logic

pub mod pow;
pub mod validation;

pub use pow::{MAX_DIFFICULTY, Miner, MinerConfig, MiningResult, meets_difficulty, valid_hash};
pub use validation::{
    ValidationError,
    validate_transaction, validate_block, validate_chain, validate_mineable_chain,
    is_valid_transaction, is_valid_block, is_valid_chain, is_valid_mineable_chain,
};
