// Chain containers

use crate::core::{Block, BlockData, Transaction};

/// Ordered, read-only view of a block sequence (index 0 = genesis)
pub trait ChainView {
    type Block: BlockData;

    /// All blocks in chain order
    fn blocks(&self) -> &[Self::Block];

    /// First block, if any
    fn genesis(&self) -> Option<&Self::Block> {
        self.blocks().first()
    }

    /// Most recently appended block
    fn head(&self) -> Option<&Self::Block> {
        self.blocks().last()
    }

    /// Number of blocks, genesis included
    fn height(&self) -> usize {
        self.blocks().len()
    }
}

/// Chains that accept blocks without proof-of-work.
///
/// Mineable ledgers do not implement this: their only way to
/// grow is mining.
pub trait AppendBlock: ChainView {
    /// Append `block` as-is; links are not checked
    fn add_block(&mut self, block: Self::Block);
}

/// Plain hash-linked chain
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Create a chain holding only the genesis block
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// Build a block over the current head and append it
    pub fn append_transactions(&mut self, transactions: Vec<Transaction>) -> &Block {
        let previous_hash = self.blocks.last().map(|head| head.hash);
        let index = self.blocks.len();
        self.blocks.push(Block::new(transactions, previous_hash));
        &self.blocks[index]
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainView for Chain {
    type Block = Block;

    fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl AppendBlock for Chain {
    fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }
}
