use {
    crate::{
        error::{DiceError, DiceResult},
        types::BlockHash,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    sha3::{Digest, Keccak256},
    tracing::debug,
};

/// A sealed block.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Block {
    pub number: u64,
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
    pub tx_count: u32,
}

/// Append-only sequence of sealed blocks plus the block being filled.
///
/// Before the first seal there is no finalized block and the reference hash is
/// all zeroes.
#[derive(Clone, Debug)]
pub struct Chain {
    seed: u64,
    blocks: Vec<Block>,
    pending_root: [u8; 32],
    pending_txs: u32,
}

impl Chain {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            blocks: Vec::new(),
            pending_root: [0u8; 32],
            pending_txs: 0,
        }
    }

    /// Continues a chain from a known finalized block. The head must leave
    /// room for a successor.
    pub fn resume(seed: u64, head: Block) -> DiceResult<Self> {
        if head.number == u64::MAX {
            return Err(DiceError::Overflow);
        }
        let mut chain = Self::new(seed);
        chain.blocks.push(head);
        Ok(chain)
    }

    pub fn head(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Hash of the most recently finalized block, the seed every pending
    /// transaction rolls against.
    pub fn latest_hash(&self) -> BlockHash {
        self.head().map(|b| b.hash).unwrap_or(BlockHash::ZERO)
    }

    /// Number the pending block will get when sealed. Saturates at
    /// `u64::MAX`.
    pub fn pending_number(&self) -> u64 {
        self.head().map(|b| b.number.saturating_add(1)).unwrap_or(0)
    }

    pub fn pending_tx_count(&self) -> u32 {
        self.pending_txs
    }

    pub fn block(&self, number: u64) -> Option<&Block> {
        let first = self.blocks.first()?.number;
        let index = number.checked_sub(first)?;
        self.blocks.get(usize::try_from(index).ok()?)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Folds a committed transaction into the pending block.
    pub fn record(&mut self, tx: &[u8]) {
        let mut hasher = Keccak256::new();
        hasher.update(self.pending_root);
        hasher.update(tx);
        self.pending_root.copy_from_slice(&hasher.finalize());
        self.pending_txs += 1;
    }

    /// Finalizes the pending block, which changes the reference hash for every
    /// later transaction.
    pub fn seal(&mut self) -> &Block {
        let number = self.pending_number();
        let parent_hash = self.latest_hash();

        let mut hasher = Keccak256::new();
        hasher.update(parent_hash.as_bytes());
        hasher.update(number.to_be_bytes());
        hasher.update(self.seed.to_be_bytes());
        hasher.update(self.pending_root);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hasher.finalize());

        let block = Block {
            number,
            hash: BlockHash(hash),
            parent_hash,
            tx_count: self.pending_txs,
        };
        debug!(number, hash = %block.hash, txs = block.tx_count, "sealed block");

        self.blocks.push(block);
        self.pending_root = [0u8; 32];
        self.pending_txs = 0;
        &self.blocks[self.blocks.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_chain_has_zero_reference() {
        let chain = Chain::new(0);
        assert!(chain.is_empty());
        assert_eq!(chain.latest_hash(), BlockHash::ZERO);
        assert_eq!(chain.pending_number(), 0);
    }

    #[test]
    fn test_seal_links_blocks() {
        let mut chain = Chain::new(7);
        let first = chain.seal().clone();
        assert_eq!(first.number, 0);
        assert_eq!(first.parent_hash, BlockHash::ZERO);
        assert!(!first.hash.is_zero());

        chain.record(b"tx");
        let second = chain.seal().clone();
        assert_eq!(second.number, 1);
        assert_eq!(second.parent_hash, first.hash);
        assert_eq!(second.tx_count, 1);
        assert_eq!(chain.latest_hash(), second.hash);
        assert_eq!(chain.block(0), Some(&first));
        assert_eq!(chain.pending_tx_count(), 0);
    }

    #[test]
    fn test_hashes_depend_on_seed_and_contents() {
        let mut a = Chain::new(1);
        let mut b = Chain::new(2);
        assert_ne!(a.seal().hash, b.seal().hash);

        let mut c = Chain::new(1);
        let mut d = Chain::new(1);
        c.record(b"one");
        d.record(b"two");
        assert_ne!(c.seal().hash, d.seal().hash);

        let mut e = Chain::new(1);
        assert_eq!(e.seal().hash, Chain::new(1).seal().hash);
    }

    #[test]
    fn test_resume_continues_numbering() {
        let head = Block {
            number: 100,
            hash: BlockHash([0x11; 32]),
            parent_hash: BlockHash::ZERO,
            tx_count: 0,
        };
        let mut chain = Chain::resume(0, head.clone()).unwrap();
        assert_eq!(chain.latest_hash(), BlockHash([0x11; 32]));
        assert_eq!(chain.pending_number(), 101);
        assert_eq!(chain.seal().parent_hash, head.hash);
        assert_eq!(chain.block(100), Some(&head));
        assert_eq!(chain.block(99), None);
    }

    #[test]
    fn test_resume_rejects_last_block_number() {
        let head = |number| Block {
            number,
            hash: BlockHash([0x22; 32]),
            parent_hash: BlockHash::ZERO,
            tx_count: 0,
        };
        assert!(matches!(
            Chain::resume(0, head(u64::MAX)),
            Err(DiceError::Overflow)
        ));

        let mut chain = Chain::resume(0, head(u64::MAX - 1)).unwrap();
        assert_eq!(chain.seal().number, u64::MAX);
        assert_eq!(chain.pending_number(), u64::MAX);
    }
}
