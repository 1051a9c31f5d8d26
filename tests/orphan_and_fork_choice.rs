//! End-to-end coverage for the block pool's two defining behaviors:
//! an orphan block held until its parent resolves, and a side branch
//! that does not carry enough work to displace the active tip.

use cashcore::chain::safe_chain::ReorganizeEvent;
use cashcore::chain::{BlockPool, ChainStatePopulator, FastChain, InMemoryFastChain, SafeChain};
use cashcore::consensus::{reward, AblaConfig, AblaState};
use cashcore::error::CoreError;
use cashcore::mempool::{Mempool, MempoolLimits};
use cashcore::organize::{BlockOrganizer, PriorityLock};
use cashcore::primitives::{make_block_ref, Block, BlockHeader, BlockRef, OutPoint, Output, Transaction, TxInput};
use cashcore::validate::AlwaysAccept;
use cashcore::Network;

fn next_block_with_nonce(chain: &InMemoryFastChain, network: &Network, height: u64, nonce: u64) -> BlockRef {
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
    let merkle = cashcore::hash::merkle_root(&[coinbase.calculate_hash()]);
    let block = Block {
        header: BlockHeader {
            version: state.version_next,
            prev_hash: parent.hash,
            merkle_root: merkle,
            timestamp: state.median_time_past + 1,
            bits: state.bits_next,
            nonce,
        },
        transactions: vec![coinbase],
    };
    make_block_ref(block)
}

/// Build a child of `parent` directly, bypassing the chain tip, so the
/// resulting block references a prev_hash the chain/pool doesn't know
/// about yet.
fn child_of(parent: &BlockRef, _network: &Network, height: u64) -> BlockRef {
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
    let merkle = cashcore::hash::merkle_root(&[coinbase.calculate_hash()]);
    let block = Block {
        header: BlockHeader {
            version: 0x2000_0000,
            prev_hash: parent.hash,
            merkle_root: merkle,
            timestamp: parent.block.header.timestamp + 1,
            bits: parent.block.header.bits,
            nonce: 0,
        },
        transactions: vec![coinbase],
    };
    make_block_ref(block)
}

struct Harness {
    chain: InMemoryFastChain,
    network: Network,
    safe_chain: SafeChain,
    block_pool: BlockPool,
    mempool: Mempool,
    lock: PriorityLock,
}

impl Harness {
    fn new() -> Self {
        let genesis = make_block_ref(Block::genesis(1_600_000_000, 0x1d00ffff));
        let chain = InMemoryFastChain::new(genesis, AblaState::genesis(&AblaConfig::default()));
        Self {
            chain,
            network: Network::regtest(),
            safe_chain: SafeChain::new(),
            block_pool: BlockPool::new(100),
            mempool: Mempool::new(MempoolLimits::default()),
            lock: PriorityLock::new(),
        }
    }

    fn organizer(&self) -> BlockOrganizer<'_> {
        BlockOrganizer {
            chain: &self.chain,
            safe_chain: &self.safe_chain,
            block_pool: &self.block_pool,
            mempool: &self.mempool,
            network: &self.network,
            verifier: &AlwaysAccept,
            lock: &self.lock,
            allow_collisions: false,
            max_block_size: 32_000_000,
            buckets: 2,
            reorganization_limit: 100,
        }
    }
}

#[test]
fn orphan_is_rejected_then_resolves_once_its_parent_attaches() {
    let harness = Harness::new();
    let organizer = harness.organizer();

    let parent = next_block_with_nonce(&harness.chain, &harness.network, 1, 0);
    let child = child_of(&parent, &harness.network, 2);

    // The child's parent is neither on-chain nor pooled yet.
    let err = organizer.organize(child.clone()).unwrap_err();
    assert!(matches!(err, CoreError::Orphan(_)));
    assert!(harness.block_pool.contains(&child.hash));

    // Once the parent attaches, replaying the pooled orphan succeeds.
    organizer.organize(parent).unwrap();
    harness.block_pool.remove(&[child.hash]);
    let event = organizer.organize(child).unwrap();
    assert!(matches!(event, ReorganizeEvent::Attached { branch_height: 1, .. }));
    assert_eq!(harness.chain.get_last_height(), 2);
}

#[test]
fn side_branch_with_equal_work_stays_pooled_without_reorganizing() {
    let harness = Harness::new();
    let organizer = harness.organizer();

    let first = next_block_with_nonce(&harness.chain, &harness.network, 1, 0);
    organizer.organize(first.clone()).unwrap();
    assert_eq!(harness.chain.get_last_height(), 1);
    let active_tip = harness.chain.get_block_hash(1).unwrap();

    // A different block at the same height, same bits, competing for
    // the tip: same cumulative work as the active chain, so it should
    // not trigger a reorganization.
    let genesis_hash = harness.chain.get_block_hash(0).unwrap();
    let competitor = {
        let coinbase = Transaction {
            version: 1,
            inputs: vec![TxInput {
                prevout: OutPoint::coinbase(),
                unlocking_script: 1u64.to_le_bytes().to_vec(),
                sequence: 0xffff_ffff,
            }],
            outputs: vec![Output { value: reward::subsidy_at_height(1), script_pubkey: vec![] }],
            lock_time: 0,
        };
        let merkle = cashcore::hash::merkle_root(&[coinbase.calculate_hash()]);
        make_block_ref(Block {
            header: BlockHeader {
                version: first.block.header.version,
                prev_hash: genesis_hash,
                merkle_root: merkle,
                timestamp: first.block.header.timestamp,
                bits: first.block.header.bits,
                nonce: 1,
            },
            transactions: vec![coinbase],
        })
    };

    let event = organizer.organize(competitor.clone()).unwrap();
    assert!(matches!(event, ReorganizeEvent::Attached { branch_height: 0, .. }));
    // The active tip did not move: equal work never displaces it.
    assert_eq!(harness.chain.get_last_height(), 1);
    assert_eq!(harness.chain.get_block_hash(1), Some(active_tip));
    assert!(harness.block_pool.contains(&competitor.hash));
}
