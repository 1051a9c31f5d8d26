//! End-to-end coverage for a fresh chain: genesis invariants, then
//! attaching two sequential blocks through the full organizer pipeline.

use cashcore::chain::{BlockPool, ChainStatePopulator, FastChain, InMemoryFastChain, SafeChain};
use cashcore::chain::safe_chain::ReorganizeEvent;
use cashcore::consensus::{reward, AblaConfig, AblaState};
use cashcore::mempool::{Mempool, MempoolLimits};
use cashcore::organize::{BlockOrganizer, PriorityLock};
use cashcore::primitives::{make_block_ref, Block, BlockHeader, BlockRef, OutPoint, Output, Transaction, TxInput};
use cashcore::validate::AlwaysAccept;
use cashcore::Network;

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
    let merkle = cashcore::hash::merkle_root(&[coinbase.calculate_hash()]);
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
fn fresh_genesis_has_expected_shape() {
    let genesis = Block::genesis(1_600_000_000, 0x1d00ffff);
    assert_eq!(genesis.transactions.len(), 1);
    assert!(genesis.transactions[0].is_coinbase());
    assert_eq!(genesis.calculate_merkle_root(), genesis.header.merkle_root);

    let genesis_ref = make_block_ref(genesis);
    let chain = InMemoryFastChain::new(genesis_ref.clone(), AblaState::genesis(&AblaConfig::default()));
    assert_eq!(chain.get_last_height(), 0);
    assert!(chain.get_block_exists(&genesis_ref.hash));
    assert_eq!(chain.get_block_hash(0), Some(genesis_ref.hash));
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
fn attaching_two_sequential_blocks_advances_the_tip_each_time() {
    let harness = Harness::new();
    let organizer = harness.organizer();

    let block1 = next_block(&harness.chain, &harness.network, 1);
    let event1 = organizer.organize(block1).unwrap();
    assert!(matches!(event1, ReorganizeEvent::Attached { branch_height: 0, .. }));
    assert_eq!(harness.chain.get_last_height(), 1);

    let block2 = next_block(&harness.chain, &harness.network, 2);
    let event2 = organizer.organize(block2).unwrap();
    assert!(matches!(event2, ReorganizeEvent::Attached { branch_height: 1, .. }));
    assert_eq!(harness.chain.get_last_height(), 2);
}
