// Transaction, block and chain validation
//
// Every check here only borrows what it inspects. The `validate_*` functions
// report the first failure; the `is_valid_*` predicates collapse that to a bool.

use crate::consensus::pow::valid_hash;
use crate::core::{BlockData, ChainView, Transaction};
use crate::ledger::MineableChain;
use crate::wallet::{self, Address};
use std::collections::HashSet;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Transaction amount is zero or negative
    NonPositiveAmount(i64),
    /// Signature does not verify against the signer's key
    InvalidSignature,
    /// Block has no recorded hash or nonce
    UnminedBlock,
    /// Stored hash differs from the recomputed one
    HashMismatch,
    /// Transaction at `index` failed its own checks
    InvalidTransaction { index: usize, reason: Box<ValidationError> },
    /// Chain holds no blocks at all
    EmptyChain,
    /// Genesis block references a predecessor
    GenesisHasPredecessor,
    /// Non-genesis block has no previous hash
    MissingPreviousHash { height: usize },
    /// Previous hash does not match the preceding block
    BrokenLink { height: usize },
    /// Block at `height` failed block validation
    InvalidBlock { height: usize, reason: Box<ValidationError> },
    /// Block hash doesn't meet the difficulty
    InvalidProofOfWork { height: usize },
    /// More than one reward transaction in a block
    MultipleRewards { height: usize },
    /// Reward amount differs from the chain reward
    InvalidRewardAmount { height: usize, amount: i64 },
    /// A party spent more than it received
    NegativeBalance { address: Address, balance: i128 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ValidationError::NonPositiveAmount(amount) => write!(f, "Non-positive amount {}", amount),
            ValidationError::InvalidSignature => write!(f, "Invalid signature"),
            ValidationError::UnminedBlock => write!(f, "Block has not been mined"),
            ValidationError::HashMismatch => write!(f, "Stored hash does not match block contents"),
            ValidationError::InvalidTransaction { index, reason } => {
                write!(f, "Transaction {} invalid: {}", index, reason)
            }
            ValidationError::EmptyChain => write!(f, "Chain has no blocks"),
            ValidationError::GenesisHasPredecessor => write!(f, "Genesis block has a previous hash"),
            ValidationError::MissingPreviousHash { height } => {
                write!(f, "Block {} has no previous hash", height)
            }
            ValidationError::BrokenLink { height } => {
                write!(f, "Block {} does not link to block {}", height, height - 1)
            }
            ValidationError::InvalidBlock { height, reason } => {
                write!(f, "Block {} invalid: {}", height, reason)
            }
            ValidationError::InvalidProofOfWork { height } => {
                write!(f, "Block {} has invalid proof of work", height)
            }
            ValidationError::MultipleRewards { height } => {
                write!(f, "Block {} has more than one reward transaction", height)
            }
            ValidationError::InvalidRewardAmount { height, amount } => {
                write!(f, "Block {} pays a reward of {}", height, amount)
            }
            ValidationError::NegativeBalance { address, balance } => {
                write!(f, "Balance of {} is {}", address, balance)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a transaction: positive amount and a signature by its signer
pub fn validate_transaction(tx: &Transaction) -> Result<(), ValidationError> {
    if tx.amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(tx.amount));
    }

    if !wallet::verify(tx.signer(), &tx.message(), &tx.signature) {
        return Err(ValidationError::InvalidSignature);
    }

    Ok(())
}

/// Validate a block: stored hash matches contents, then every transaction
pub fn validate_block<B: BlockData>(block: &B) -> Result<(), ValidationError> {
    let (Some(stored), Some(nonce)) = (block.hash(), block.nonce()) else {
        return Err(ValidationError::UnminedBlock);
    };

    if block.compute_hash(nonce) != *stored {
        return Err(ValidationError::HashMismatch);
    }

    for (index, tx) in block.transactions().iter().enumerate() {
        validate_transaction(tx).map_err(|reason| ValidationError::InvalidTransaction {
            index,
            reason: Box::new(reason),
        })?;
    }

    Ok(())
}

/// Validate links and contents of every block, in chain order
pub fn validate_chain<C: ChainView>(chain: &C) -> Result<(), ValidationError> {
    let blocks = chain.blocks();
    let genesis = blocks.first().ok_or(ValidationError::EmptyChain)?;

    if genesis.previous_hash().is_some() {
        return Err(ValidationError::GenesisHasPredecessor);
    }

    for (height, block) in blocks.iter().enumerate() {
        if height > 0 {
            let previous_hash = block
                .previous_hash()
                .ok_or(ValidationError::MissingPreviousHash { height })?;
            if blocks[height - 1].hash() != Some(previous_hash) {
                return Err(ValidationError::BrokenLink { height });
            }
        }

        validate_block(block).map_err(|reason| ValidationError::InvalidBlock {
            height,
            reason: Box::new(reason),
        })?;
    }

    Ok(())
}

/// Audit a mined ledger: difficulty, reward rules and non-negative balances.
///
/// Signatures and hash contents are not rechecked here; `validate_chain`
/// covers those.
pub fn validate_mineable_chain(chain: &MineableChain) -> Result<(), ValidationError> {
    let mut parties = HashSet::new();

    for (height, block) in chain.blocks().iter().enumerate() {
        if height > 0 && !valid_hash(block, chain.difficulty()) {
            return Err(ValidationError::InvalidProofOfWork { height });
        }

        let mut reward_seen = false;
        for tx in block.transactions() {
            match tx.source {
                None => {
                    if reward_seen {
                        return Err(ValidationError::MultipleRewards { height });
                    }
                    reward_seen = true;
                    if tx.amount != chain.reward() {
                        return Err(ValidationError::InvalidRewardAmount {
                            height,
                            amount: tx.amount,
                        });
                    }
                }
                Some(source) => {
                    parties.insert(source);
                }
            }
            parties.insert(tx.recipient);
        }
    }

    for party in &parties {
        let balance = chain.balance(party);
        if balance < 0 {
            return Err(ValidationError::NegativeBalance {
                address: Address::from_public_key(party),
                balance,
            });
        }
    }

    Ok(())
}

pub fn is_valid_transaction(tx: &Transaction) -> bool {
    report("Transaction", validate_transaction(tx))
}

pub fn is_valid_block<B: BlockData>(block: &B) -> bool {
    report("Block", validate_block(block))
}

pub fn is_valid_chain<C: ChainView>(chain: &C) -> bool {
    report("Chain", validate_chain(chain))
}

pub fn is_valid_mineable_chain(chain: &MineableChain) -> bool {
    report("Mineable chain", validate_mineable_chain(chain))
}

fn report(what: &str, result: Result<(), ValidationError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::debug!("{} rejected: {}", what, e);
            false
        }
    }
}
