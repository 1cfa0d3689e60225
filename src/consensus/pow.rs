// Proof of Work implementation

use crate::core::{BlockData, ChainView, Hash256, MineableBlock, Transaction};
use crate::ledger::{LedgerError, MineableChain};
use crate::wallet::KeyPair;
use std::time::{Duration, Instant};

/// Hex digits in a [`Hash256`]; no hash can meet a higher difficulty
pub const MAX_DIFFICULTY: usize = 64;

/// Check that a hash's hex form starts with `difficulty` zero digits
#[inline]
pub fn meets_difficulty(hash: &Hash256, difficulty: usize) -> bool {
    hash.leading_zero_digits() >= difficulty
}

/// Proof-of-work admission rule for a block. An unmined block never passes.
pub fn valid_hash<B: BlockData>(block: &B, difficulty: usize) -> bool {
    block
        .hash()
        .is_some_and(|hash| meets_difficulty(hash, difficulty))
}

/// Miner settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinerConfig {
    /// Stop after this many candidate hashes. `None` searches forever.
    pub max_attempts: Option<u64>,
}

/// Proof of Work miner
#[derive(Debug, Clone, Default)]
pub struct Miner {
    pub config: MinerConfig,
}

impl Miner {
    /// Create a new miner
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    /// Miner with no attempt bound
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Find a nonce whose hash meets `difficulty`, starting from 0.
    ///
    /// Returns `None` only when `max_attempts` is set and used up.
    pub fn search(&self, block: &MineableBlock, difficulty: usize) -> Option<MiningResult> {
        let start_time = Instant::now();
        let mut attempts = 0u64;

        for nonce in 0..=u64::MAX {
            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                break;
            }

            let hash = block.compute_hash(nonce);
            attempts += 1;

            if meets_difficulty(&hash, difficulty) {
                return Some(MiningResult {
                    nonce,
                    hash,
                    attempts,
                    duration: start_time.elapsed(),
                });
            }

            // Progress indicator every 100k attempts
            if attempts % 100_000 == 0 {
                let elapsed = start_time.elapsed();
                log::debug!("Mining attempts: {} ({:.1} KH/s)",
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64() / 1000.0
                );
            }
        }

        None
    }

    /// Mine the chain's pending transactions plus a reward for `key` into a new block.
    ///
    /// The pending pool is emptied before the search starts. If the search is
    /// exhausted the snapshot goes back to the front of the pool and the chain
    /// is left untouched.
    pub fn mine(&self, chain: &mut MineableChain, key: &KeyPair) -> Result<MiningResult, LedgerError> {
        let reward = Transaction::reward(key, chain.reward());
        let snapshot = chain.take_pending();
        let snapshot_len = snapshot.len();

        let mut transactions = snapshot;
        transactions.push(reward);

        let previous_hash = chain.head_hash();
        let mut block = MineableBlock::new(transactions, previous_hash);

        match self.search(&block, chain.difficulty()) {
            Some(result) => {
                block.seal(result.nonce, result.hash);
                log::info!("Mined block {} at height {} (nonce={}, {} txs, {} attempts)",
                    result.hash,
                    chain.height(),
                    result.nonce,
                    block.transactions.len(),
                    result.attempts
                );
                chain.push_mined(block);
                Ok(result)
            }
            None => {
                let attempts = self.config.max_attempts.unwrap_or(u64::MAX);
                log::warn!("Mining gave up after {} attempts at difficulty {}",
                    attempts,
                    chain.difficulty()
                );
                block.transactions.truncate(snapshot_len);
                chain.restore_pending(block.transactions);
                Err(LedgerError::MiningExhausted { attempts })
            }
        }
    }
}

/// Mining result
#[derive(Debug, Clone)]
pub struct MiningResult {
    /// The nonce that was found
    pub nonce: u64,
    /// The resulting hash
    pub hash: Hash256,
    /// Number of attempts
    pub attempts: u64,
    /// Time taken
    pub duration: Duration,
}

impl MiningResult {
    /// Calculate hash rate (hashes per second), 0 when no time was measured
    pub fn hash_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.attempts as f64 / secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_difficulty_matches_hex_prefix() {
        let mut bytes = [0xabu8; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0c;
        let hash = Hash256::new(bytes);

        for difficulty in 0..6 {
            let expected = hash.to_hex().starts_with(&"0".repeat(difficulty));
            assert_eq!(meets_difficulty(&hash, difficulty), expected, "difficulty {}", difficulty);
        }
    }

    #[test]
    fn test_zero_difficulty_accepts_anything() {
        assert!(meets_difficulty(&Hash256::new([0xff; 32]), 0));
    }

    #[test]
    fn test_valid_hash_rejects_unmined_block() {
        let block = MineableBlock::new(Vec::new(), None);
        assert!(!valid_hash(&block, 0));
    }

    #[test]
    fn test_search_finds_first_valid_nonce() {
        let block = MineableBlock::new(Vec::new(), Some(Hash256::new([3; 32])));
        let result = Miner::unbounded().search(&block, 1).unwrap();

        assert!(meets_difficulty(&result.hash, 1));
        assert_eq!(result.hash, block.compute_hash(result.nonce));
        assert_eq!(result.attempts, result.nonce + 1);
        for earlier in 0..result.nonce {
            assert!(!meets_difficulty(&block.compute_hash(earlier), 1));
        }
    }

    #[test]
    fn test_search_respects_max_attempts() {
        let block = MineableBlock::new(Vec::new(), None);
        let miner = Miner::new(MinerConfig { max_attempts: Some(5) });

        // 64 zero digits is never reached in 5 tries
        assert!(miner.search(&block, 64).is_none());
        assert!(Miner::new(MinerConfig { max_attempts: Some(0) }).search(&block, 0).is_none());
    }

    #[test]
    fn test_mine_at_difficulty_zero() {
        let key = KeyPair::generate();
        let mut chain = MineableChain::new(0, 50);

        let result = Miner::unbounded().mine(&mut chain, &key).unwrap();
        assert_eq!(result.nonce, 0);
        assert_eq!(result.attempts, 1);

        let head = chain.head().unwrap();
        assert_eq!(chain.height(), 2);
        assert_eq!(head.transactions.len(), 1);
        assert!(head.transactions[0].is_reward());
        assert_eq!(head.transactions[0].recipient, key.public_key);
        assert_eq!(head.transactions[0].amount, 50);
        assert!(chain.pending().is_empty());
    }

    #[test]
    fn test_exhausted_mine_restores_pending() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mut chain = MineableChain::new(64, 50);
        let tx = Transaction::new(&alice, bob.public_key, 5);
        chain.add_transaction(tx.clone());

        let miner = Miner::new(MinerConfig { max_attempts: Some(10) });
        let err = miner.mine(&mut chain, &alice).unwrap_err();

        assert_eq!(err, LedgerError::MiningExhausted { attempts: 10 });
        assert_eq!(chain.height(), 1);
        assert_eq!(chain.pending(), &[tx][..]);
    }

    #[test]
    fn test_hash_rate() {
        let mut result = MiningResult {
            nonce: 0,
            hash: Hash256::default(),
            attempts: 500,
            duration: Duration::from_millis(250),
        };
        assert_eq!(result.hash_rate(), 2000.0);

        result.duration = Duration::ZERO;
        assert_eq!(result.hash_rate(), 0.0);
    }

    #[test]
    fn test_max_difficulty_is_full_digest() {
        assert_eq!(Hash256::default().to_hex().len(), MAX_DIFFICULTY);
        assert!(meets_difficulty(&Hash256::default(), MAX_DIFFICULTY));
        assert!(!meets_difficulty(&Hash256::default(), MAX_DIFFICULTY + 1));
    }

    #[test]
    fn test_mined_block_links_to_head() {
        let key = KeyPair::generate();
        let mut chain = MineableChain::new(1, 10);
        let genesis_hash = chain.genesis().unwrap().hash().copied();

        Miner::unbounded().mine(&mut chain, &key).unwrap();
        let head = chain.head().unwrap();

        assert_eq!(head.previous_hash, genesis_hash);
        assert!(valid_hash(head, 1));
        assert_eq!(head.hash(), Some(&head.compute_hash(head.nonce().unwrap())));
    }
}
