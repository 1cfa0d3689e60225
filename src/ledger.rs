// Mineable ledger: blocks, difficulty, reward and the pending pool

use crate::consensus::{MAX_DIFFICULTY, Miner, MinerConfig, MiningResult};
use crate::core::{BlockData, ChainView, Hash256, MineableBlock, Transaction};
use crate::wallet::KeyPair;
use secp256k1::PublicKey;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Ledger error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Proof-of-work search hit `max_attempts` without a valid hash
    MiningExhausted { attempts: u64 },
    /// Configuration file could not be read or parsed
    Config(String),
    /// Configuration values are out of range
    InvalidConfig(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::MiningExhausted { attempts } => {
                write!(f, "No valid nonce found after {} attempts", attempts)
            }
            LedgerError::Config(msg) => write!(f, "Config error: {}", msg),
            LedgerError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Ledger parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Required leading zero hex digits for mined blocks
    pub difficulty: usize,
    /// Amount credited to the miner of each block
    pub reward: i64,
    /// Optional bound on the nonce search
    pub max_attempts: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            reward: 50,
            max_attempts: None,
        }
    }
}

impl LedgerConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let json = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("Failed to read config file: {}", e)))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| LedgerError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty must be at most {}, got {}",
                MAX_DIFFICULTY, self.difficulty
            )));
        }
        if self.reward <= 0 {
            return Err(LedgerError::InvalidConfig(format!(
                "reward must be positive, got {}",
                self.reward
            )));
        }
        Ok(())
    }

    pub fn miner_config(&self) -> MinerConfig {
        MinerConfig {
            max_attempts: self.max_attempts,
        }
    }
}

/// Proof-of-work ledger.
///
/// Grows only through [`MineableChain::mine`]; there is no direct append:
///
/// ```compile_fail
/// use hashledger::{AppendBlock, MineableBlock, MineableChain};
///
/// let mut chain = MineableChain::new(0, 1);
/// chain.add_block(MineableBlock::new(Vec::new(), None));
/// ```
#[derive(Debug, Clone)]
pub struct MineableChain {
    blocks: Vec<MineableBlock>,
    difficulty: usize,
    reward: i64,
    pending: Vec<Transaction>,
    miner: Miner,
}

impl MineableChain {
    /// Create a ledger holding only a synthesized genesis block
    pub fn new(difficulty: usize, reward: i64) -> Self {
        Self {
            blocks: vec![MineableBlock::genesis()],
            difficulty,
            reward,
            pending: Vec::new(),
            miner: Miner::unbounded(),
        }
    }

    /// Create a ledger from validated configuration
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let mut chain = Self::new(config.difficulty, config.reward);
        chain.miner = Miner::new(config.miner_config());
        Ok(chain)
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn reward(&self) -> i64 {
        self.reward
    }

    /// Transactions waiting for the next block
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Queue a transaction for the next block. Nothing is validated here.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Mine pending transactions plus a reward for `key` into a new block
    pub fn mine(&mut self, key: &KeyPair) -> Result<MiningResult, LedgerError> {
        let miner = self.miner.clone();
        miner.mine(self, key)
    }

    /// Received minus sent for `key`, over every transaction in the chain.
    ///
    /// Summed as `i128` so no sequence of `i64` amounts can wrap or clamp.
    pub fn balance(&self, key: &PublicKey) -> i128 {
        let mut balance = 0i128;
        for tx in self.blocks.iter().flat_map(|b| b.transactions()) {
            if tx.recipient == *key {
                balance += i128::from(tx.amount);
            }
            if tx.source.as_ref() == Some(key) {
                balance -= i128::from(tx.amount);
            }
        }
        balance
    }

    /// Every public key that appears as a source or recipient
    pub fn parties(&self) -> HashSet<PublicKey> {
        let mut parties = HashSet::new();
        for tx in self.blocks.iter().flat_map(|b| b.transactions()) {
            if let Some(source) = tx.source {
                parties.insert(source);
            }
            parties.insert(tx.recipient);
        }
        parties
    }

    pub(crate) fn head_hash(&self) -> Option<Hash256> {
        self.blocks.last().and_then(|head| head.hash().copied())
    }

    pub(crate) fn take_pending(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    /// Put an unmined snapshot back ahead of anything queued since
    pub(crate) fn restore_pending(&mut self, mut snapshot: Vec<Transaction>) {
        snapshot.append(&mut self.pending);
        self.pending = snapshot;
    }

    pub(crate) fn push_mined(&mut self, block: MineableBlock) {
        debug_assert!(block.is_mined());
        self.blocks.push(block);
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<MineableBlock> {
        &mut self.blocks
    }
}

impl ChainView for MineableChain {
    type Block = MineableBlock;

    fn blocks(&self) -> &[MineableBlock] {
        &self.blocks
    }
}
