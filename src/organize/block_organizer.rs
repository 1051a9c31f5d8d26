//! `BlockOrganizer`: the top-level `check → accept → connect` pipeline
//! for a candidate block, plus fork-choice and reorganization (spec.md
//! §4.7).
//!
//! Grounded on the teacher's `blockchain/mod.rs` block-submission flow
//! (acquire write lock, validate, compare cumulative work, swap active
//! chain) but reshaped around the `Branch`/`BlockPool`/`FastChain` seam:
//! this crate's persistent storage lives behind `FastChain`, so
//! "swap active chain" becomes `FastChain::reorganize`.

use crate::chain::branch::Branch;
use crate::chain::chain_state::ChainStatePopulator;
use crate::chain::fast_chain::FastChain;
use crate::chain::safe_chain::{ReorganizeEvent, SafeChain};
use crate::chain::block_pool::BlockPool;
use crate::error::{CoreError, CoreResult};
use crate::hash::Hash32;
use crate::mempool::pool::Mempool;
use crate::network::Network;
use crate::organize::sync::PriorityLock;
use crate::populate::block::PopulateBlock;
use crate::primitives::{make_tx_ref, BlockRef};
use crate::validate::block::ValidateBlock;
use crate::validate::script::VerifyScript;

pub struct BlockOrganizer<'a> {
    pub chain: &'a dyn FastChain,
    pub safe_chain: &'a SafeChain,
    pub block_pool: &'a BlockPool,
    pub mempool: &'a Mempool,
    pub network: &'a Network,
    pub verifier: &'a dyn VerifyScript,
    pub lock: &'a PriorityLock,
    pub allow_collisions: bool,
    pub max_block_size: u64,
    pub buckets: usize,
    pub reorganization_limit: u64,
}

impl<'a> BlockOrganizer<'a> {
    pub fn organize(&self, block: BlockRef) -> CoreResult<ReorganizeEvent> {
        if self.chain.get_block_exists(&block.hash) || self.block_pool.contains(&block.hash) {
            return Err(CoreError::AlreadyPresent);
        }

        let mut standalone = Branch::new(0);
        standalone.push_front(block.clone());
        if let Err(e) = ValidateBlock::check(&standalone, self.max_block_size, self.network.retarget) {
            log::debug!("block {} rejected at check: {e}", crate::hash::hash_to_hex(&block.hash));
            return Err(e);
        }

        let _guard = self.lock.acquire_high();

        let parent_known = self.chain.get_block_exists(&block.block.header.prev_hash)
            || self.block_pool.contains(&block.block.header.prev_hash);
        if !parent_known {
            log::debug!("block {} pooled as orphan, parent unknown", crate::hash::hash_to_hex(&block.hash));
            self.block_pool.add(block.clone());
            return Err(CoreError::Orphan(crate::hash::hash_to_hex(&block.hash)));
        }

        let branch = self.block_pool.get_path(&block, |hash| self.height_of(hash));
        if branch.blocks.is_empty() {
            return Err(CoreError::AlreadyPresent);
        }

        let populator_state = ChainStatePopulator::new(self.chain, self.network);
        let state = populator_state.populate(Some(&branch)).ok_or(CoreError::ChainStateUnavailable)?;

        let populator_block = PopulateBlock { chain: self.chain, mempool: Some(self.mempool), buckets: self.buckets };
        let tx_hash_has_unspent_output =
            |hash: &Hash32| self.chain.get_transaction_position(hash, true).is_some();

        if let Err(e) = ValidateBlock::accept(&branch, &state, &populator_block, self.allow_collisions, tx_hash_has_unspent_output) {
            log::warn!("block {} rejected at accept: {e}", crate::hash::hash_to_hex(&block.hash));
            return Err(e);
        }
        if let Err(e) = ValidateBlock::connect(&branch, state.enabled_forks(), self.verifier) {
            log::warn!("block {} rejected at connect: {e}", crate::hash::hash_to_hex(&block.hash));
            return Err(e);
        }

        self.block_pool.add_all(&branch.blocks);

        let persistent_tip = self.chain.get_last_height();
        let current_work = self.chain.get_branch_work(branch.height + 1, Some(persistent_tip));
        let incoming_work = branch.cumulative_work();

        if persistent_tip > branch.height && incoming_work <= current_work {
            // Side branch does not yet overtake the active chain's work;
            // keep it pooled for a future block to extend.
            log::debug!("branch at height {} pooled, insufficient work ({incoming_work} <= {current_work})", branch.height);
            return Ok(ReorganizeEvent::Attached { branch_height: branch.height, incoming: branch.blocks.clone() });
        }

        let depth = persistent_tip.saturating_sub(branch.height);
        if depth > self.reorganization_limit {
            log::warn!("reorg to height {} rejected, depth {depth} exceeds limit {}", branch.height, self.reorganization_limit);
            return Err(CoreError::ReorgTooDeep { depth, max: self.reorganization_limit });
        }

        let outgoing = if persistent_tip > branch.height {
            self.chain.get_headers(branch.height + 1, persistent_tip)
        } else {
            Vec::new()
        };

        let fork_hash = self
            .chain
            .get_block_hash(branch.height)
            .ok_or_else(|| CoreError::StorageFault("missing fork-point hash".into()))?;
        self.chain.reorganize((fork_hash, branch.height), &branch.blocks, &outgoing)?;

        let attached_hashes: Vec<Hash32> = branch.blocks.iter().map(|b| b.hash).collect();
        self.block_pool.remove(&attached_hashes);
        self.block_pool.prune(self.chain.get_last_height(), |hash| self.height_of(hash));

        for incoming_block in &branch.blocks {
            let confirmed: Vec<Hash32> = incoming_block.block.transactions.iter().map(|t| t.calculate_hash()).collect();
            self.mempool.remove_confirmed(&confirmed);
        }
        if !outgoing.is_empty() {
            let displaced: Vec<(crate::primitives::TxRef, u64, u32)> = outgoing
                .iter()
                .flat_map(|b| b.block.transactions.iter().skip(1).cloned())
                .map(|tx| (make_tx_ref(tx), 0u64, 0u32))
                .collect();
            let tip_after = self.chain.get_last_height();
            self.mempool.reinstate(displaced, |outpoint| self.chain.get_utxo(outpoint, tip_after).is_some());
        }

        let event = if outgoing.is_empty() {
            ReorganizeEvent::Attached { branch_height: branch.height, incoming: branch.blocks.clone() }
        } else {
            log::info!("reorganized at height {}, depth {depth}", branch.height);
            ReorganizeEvent::Reorganized { branch_height: branch.height, incoming: branch.blocks.clone(), outgoing }
        };
        self.safe_chain.notify_reorganize(event.clone());
        Ok(event)
    }

    /// Resolve a hash to its height in the persistent chain. A real
    /// `FastChain` backend would expose this directly (the teacher's
    /// `hash_index` map does); the trait only exposes height-keyed
    /// lookups, so this scans back from the tip.
    fn height_of(&self, hash: &Hash32) -> Option<u64> {
        let tip = self.chain.get_last_height();
        for h in (0..=tip).rev() {
            if self.chain.get_block_hash(h).as_ref() == Some(hash) {
                return Some(h);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fast_chain::InMemoryFastChain;
    use crate::consensus::{reward, AblaConfig, AblaState};
    use crate::primitives::{make_block_ref, Block, BlockHeader, OutPoint, Output, Transaction, TxInput};
    use crate::validate::script::AlwaysAccept;

    fn next_block(chain: &InMemoryFastChain, network: &Network, height: u64) -> BlockRef {
        let populator = ChainStatePopulator::new(chain, network);
        let state = populator.populate(None).unwrap();
        let parent = chain.get_header(chain.get_last_height()).unwrap();

        let coinbase = Transaction {
            version: 1,
            inputs: vec![TxInput {
                prevout: OutPoint::coinbase(),
                unlocking_script: height.to_le_bytes().to_vec(),
                sequence: 0xffff_ffff,
            }],
            outputs: vec![Output { value: reward::subsidy_at_height(height), script_pubkey: vec![] }],
            lock_time: 0,
        };
        let merkle = crate::hash::merkle_root(&[coinbase.calculate_hash()]);
        let block = Block {
            header: BlockHeader {
                version: state.version_next,
                prev_hash: parent.hash,
                merkle_root: merkle,
                timestamp: state.median_time_past + 1,
                bits: state.bits_next,
                nonce: 0,
            },
            transactions: vec![coinbase],
        };
        make_block_ref(block)
    }

    #[test]
    fn organize_attaches_a_valid_next_block() {
        let genesis = make_block_ref(Block::genesis(1_600_000_000, 0x1d00ffff));
        let chain = InMemoryFastChain::new(genesis, AblaState::genesis(&AblaConfig::default()));
        let network = Network::regtest();
        let safe_chain = SafeChain::new();
        let block_pool = BlockPool::new(100);
        let mempool = Mempool::new(crate::mempool::pool::MempoolLimits::default());
        let lock = PriorityLock::new();
        let verifier = AlwaysAccept;

        let organizer = BlockOrganizer {
            chain: &chain,
            safe_chain: &safe_chain,
            block_pool: &block_pool,
            mempool: &mempool,
            network: &network,
            verifier: &verifier,
            lock: &lock,
            allow_collisions: false,
            max_block_size: 32_000_000,
            buckets: 2,
            reorganization_limit: 100,
        };

        let candidate = next_block(&chain, &network, 1);
        let result = organizer.organize(candidate).unwrap();
        assert!(matches!(result, ReorganizeEvent::Attached { branch_height: 0, .. }));
        assert_eq!(chain.get_last_height(), 1);
    }

    #[test]
    fn organize_rejects_block_already_present() {
        let genesis = make_block_ref(Block::genesis(1_600_000_000, 0x1d00ffff));
        let chain = InMemoryFastChain::new(genesis.clone(), AblaState::genesis(&AblaConfig::default()));
        let network = Network::regtest();
        let safe_chain = SafeChain::new();
        let block_pool = BlockPool::new(100);
        let mempool = Mempool::new(crate::mempool::pool::MempoolLimits::default());
        let lock = PriorityLock::new();
        let verifier = AlwaysAccept;

        let organizer = BlockOrganizer {
            chain: &chain,
            safe_chain: &safe_chain,
            block_pool: &block_pool,
            mempool: &mempool,
            network: &network,
            verifier: &verifier,
            lock: &lock,
            allow_collisions: false,
            max_block_size: 32_000_000,
            buckets: 2,
            reorganization_limit: 100,
        };

        assert!(matches!(organizer.organize(genesis), Err(CoreError::AlreadyPresent)));
    }
}
