//! End-to-end `BlockOrganizer::organize` throughput attaching sequential
//! blocks to a fresh chain (spec.md §4.1, §5).

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use cashcore::chain::{BlockPool, ChainStatePopulator, FastChain, InMemoryFastChain, SafeChain};
use cashcore::consensus::{reward, AblaConfig, AblaState};
use cashcore::mempool::{Mempool, MempoolLimits};
use cashcore::organize::{BlockOrganizer, PriorityLock};
use cashcore::primitives::{make_block_ref, Block, BlockHeader, BlockRef, OutPoint, Output, Transaction, TxInput};
use cashcore::validate::AlwaysAccept;
use cashcore::Network;

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

    fn next_block(&self, height: u64) -> BlockRef {
        let populator = ChainStatePopulator::new(&self.chain, &self.network);
        let state = populator.populate(None).unwrap();
        let parent = self.chain.get_header(self.chain.get_last_height()).unwrap();

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
}

fn organize_a_single_empty_block(c: &mut Criterion) {
    c.bench_function("organize_single_empty_block", |b| {
        b.iter_batched(
            || {
                let harness = Harness::new();
                let block = harness.next_block(1);
                (harness, block)
            },
            |(harness, block)| harness.organizer().organize(block).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

fn organize_a_chain_of_a_hundred_blocks(c: &mut Criterion) {
    c.bench_function("organize_chain_of_100_blocks", |b| {
        b.iter_batched(
            Harness::new,
            |harness| {
                let organizer = harness.organizer();
                for height in 1..=100u64 {
                    let block = harness.next_block(height);
                    organizer.organize(block).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(chain, organize_a_single_empty_block, organize_a_chain_of_a_hundred_blocks);
criterion_main!(chain);
