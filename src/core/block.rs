// Block data structures

use crate::core::{Hash256, hash256, Transaction};

/// Deterministic block digest shared by every block kind.
///
/// hash256(previous_hash? ++ transactions ++ nonce)
pub fn block_hash(previous_hash: Option<&Hash256>, transactions: &[Transaction], nonce: u64) -> Hash256 {
    let mut buf = Vec::new();
    if let Some(prev) = previous_hash {
        buf.extend_from_slice(prev.as_bytes());
    }
    for tx in transactions {
        tx.write_to(&mut buf);
    }
    buf.extend_from_slice(&nonce.to_le_bytes());
    hash256(&buf)
}

/// Read access shared by simple and mineable blocks
pub trait BlockData {
    /// Transactions in block order
    fn transactions(&self) -> &[Transaction];

    /// Hash of the predecessor, `None` for genesis
    fn previous_hash(&self) -> Option<&Hash256>;

    /// Cached hash, `None` while unmined
    fn hash(&self) -> Option<&Hash256>;

    /// Nonce the cached hash was computed with, `None` while unmined
    fn nonce(&self) -> Option<u64>;

    /// Hash of this block's contents under `nonce`
    fn compute_hash(&self, nonce: u64) -> Hash256 {
        block_hash(self.previous_hash(), self.transactions(), nonce)
    }

    /// Check if this is a genesis block
    fn is_genesis(&self) -> bool {
        self.previous_hash().is_none()
    }
}

/// Block hashed at construction with nonce 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Transactions in this block
    pub transactions: Vec<Transaction>,
    /// Hash of the previous block
    pub previous_hash: Option<Hash256>,
    /// Cached block hash
    pub hash: Hash256,
    /// Nonce used for `hash`
    pub nonce: u64,
}

impl Block {
    /// Create a new block
    pub fn new(transactions: Vec<Transaction>, previous_hash: Option<Hash256>) -> Self {
        let nonce = 0;
        let hash = block_hash(previous_hash.as_ref(), &transactions, nonce);
        Self {
            transactions,
            previous_hash,
            hash,
            nonce,
        }
    }

    /// Create the genesis block
    pub fn genesis() -> Self {
        Self::new(Vec::new(), None)
    }
}

impl BlockData for Block {
    fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn previous_hash(&self) -> Option<&Hash256> {
        self.previous_hash.as_ref()
    }

    fn hash(&self) -> Option<&Hash256> {
        Some(&self.hash)
    }

    fn nonce(&self) -> Option<u64> {
        Some(self.nonce)
    }
}

/// Block whose hash and nonce are found by proof-of-work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineableBlock {
    /// Transactions in this block (reward last)
    pub transactions: Vec<Transaction>,
    /// Hash of the previous block
    pub previous_hash: Option<Hash256>,
    hash: Option<Hash256>,
    nonce: Option<u64>,
}

impl MineableBlock {
    /// Create an unmined block
    pub fn new(transactions: Vec<Transaction>, previous_hash: Option<Hash256>) -> Self {
        Self {
            transactions,
            previous_hash,
            hash: None,
            nonce: None,
        }
    }

    /// Empty genesis block, sealed at nonce 0 (exempt from difficulty)
    pub fn genesis() -> Self {
        let mut genesis = Self::new(Vec::new(), None);
        let hash = genesis.compute_hash(0);
        genesis.seal(0, hash);
        genesis
    }

    /// Whether a nonce and hash have been recorded
    pub fn is_mined(&self) -> bool {
        self.hash.is_some() && self.nonce.is_some()
    }

    /// Record the proof-of-work result. Called once, by the miner.
    pub(crate) fn seal(&mut self, nonce: u64, hash: Hash256) {
        debug_assert!(!self.is_mined(), "block sealed twice");
        self.nonce = Some(nonce);
        self.hash = Some(hash);
    }
}

impl BlockData for MineableBlock {
    fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn previous_hash(&self) -> Option<&Hash256> {
        self.previous_hash.as_ref()
    }

    fn hash(&self) -> Option<&Hash256> {
        self.hash.as_ref()
    }

    fn nonce(&self) -> Option<u64> {
        self.nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::KeyPair;

    #[test]
    fn test_block_hash_deterministic() {
        let kp = KeyPair::generate();
        let txs = vec![Transaction::reward(&kp, 5)];
        let prev = Hash256::new([7; 32]);

        let a = block_hash(Some(&prev), &txs, 42);
        assert_eq!(a, block_hash(Some(&prev), &txs, 42));
        assert_ne!(a, block_hash(Some(&prev), &txs, 43));
        assert_ne!(a, block_hash(None, &txs, 42));
        assert_ne!(a, block_hash(Some(&prev), &[], 42));
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();
        assert!(genesis.is_genesis());
        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.hash, genesis.compute_hash(0));
    }

    #[test]
    fn test_simple_block_cached_hash() {
        let kp = KeyPair::generate();
        let block = Block::new(vec![Transaction::reward(&kp, 1)], Some(Hash256::new([1; 32])));

        assert!(!block.is_genesis());
        assert_eq!(BlockData::hash(&block), Some(&block.compute_hash(block.nonce)));
    }

    #[test]
    fn test_mineable_block_starts_unmined() {
        let block = MineableBlock::new(Vec::new(), Some(Hash256::new([1; 32])));
        assert!(!block.is_mined());
        assert!(block.hash().is_none());
        assert!(block.nonce().is_none());
    }

    #[test]
    fn test_mineable_genesis_sealed() {
        let genesis = MineableBlock::genesis();
        assert!(genesis.is_mined());
        assert!(genesis.is_genesis());
        assert_eq!(genesis.nonce(), Some(0));
        assert_eq!(genesis.hash(), Some(&genesis.compute_hash(0)));
    }

    #[test]
    fn test_simple_and_mineable_share_hash_function() {
        let kp = KeyPair::generate();
        let txs = vec![Transaction::reward(&kp, 9)];
        let simple = Block::new(txs.clone(), None);
        let mineable = MineableBlock::new(txs, None);

        assert_eq!(simple.compute_hash(0), mineable.compute_hash(0));
    }
}
