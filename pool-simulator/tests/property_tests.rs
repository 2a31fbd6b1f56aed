//! Property-based tests for simulator invariants
//!
//! These tests use proptest to verify:
//! - Zero growth: unchanged totals give a zero rate
//! - Scale invariance: proportional growth gives the same rate at any size
//! - Basis points stay within 0..=10000 for parts of a whole
//! - Query determinism: identical queries give identical pages
//! - Share conservation: holder positions sum to the minted total
//! - Deterministic replay: same records → byte-identical results

use alloy_primitives::{Address, B256, I256, U256};
use pool_simulator::{
    events::{build, names},
    math::{self, annualized_rate, basis_points},
    query::query_rewards,
    types::NULL_ADDRESS,
    Config, Direction, EntityStore, LogRecord, NoReads, OrderBy, Reward, RewardQuery, Simulator,
    TxContext,
};
use proptest::prelude::*;

const HOLDERS: [Address; 3] = [
    Address::new([0x01; 20]),
    Address::new([0x02; 20]),
    Address::new([0x03; 20]),
];

#[derive(Debug, Clone)]
enum Op {
    Deposit { holder: usize, amount: u64, shares: u64 },
    Move { from: usize, to: usize, shares: u64 },
}

/// Strategy for generating deposits and transfers between a few holders
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1u64..1_000_000, 1u64..1_000_000)
            .prop_map(|(holder, amount, shares)| Op::Deposit { holder, amount, shares }),
        (0usize..3, 0usize..3, 0u64..1_000_000).prop_map(|(from, to, shares)| Op::Move { from, to, shares }),
    ]
}

fn records(op: &Op) -> Vec<LogRecord> {
    match *op {
        Op::Deposit { holder, amount, shares } => {
            let holder = HOLDERS[holder];
            vec![
                LogRecord::new(
                    names::SUBMITTED,
                    0,
                    Address::ZERO,
                    build::submitted(holder, U256::from(amount), None),
                ),
                LogRecord::new(
                    names::TRANSFER,
                    1,
                    Address::ZERO,
                    build::transfer(NULL_ADDRESS, holder, U256::from(amount)),
                ),
                LogRecord::new(
                    names::TRANSFER_SHARES,
                    2,
                    Address::ZERO,
                    build::transfer_shares(NULL_ADDRESS, holder, U256::from(shares)),
                ),
            ]
        }
        Op::Move { from, to, shares } => {
            let (from, to) = (HOLDERS[from], HOLDERS[to]);
            vec![
                LogRecord::new(names::TRANSFER, 0, Address::ZERO, build::transfer(from, to, U256::from(shares))),
                LogRecord::new(
                    names::TRANSFER_SHARES,
                    1,
                    Address::ZERO,
                    build::transfer_shares(from, to, U256::from(shares)),
                ),
            ]
        }
    }
}

fn replay(ops: &[Op]) -> (Simulator, Vec<String>) {
    let mut sim = Simulator::new(Config::default()).unwrap();
    let mut outputs = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        let tx = TxContext {
            tx_hash: B256::left_padding_from(&(i as u64 + 1).to_be_bytes()),
            block_number: i as u64 + 1,
            block_timestamp: (i as u64 + 1) * 12,
            transaction_index: 0,
        };
        let result = sim.process(&tx, &records(op), &NoReads).unwrap();
        outputs.push(serde_json::to_string(&result).unwrap());
    }
    (sim, outputs)
}

fn reward(i: usize, block: u64, time: u64, apr: f64) -> Reward {
    let mut reward = Reward::new(B256::left_padding_from(&(i as u64).to_be_bytes()));
    reward.block_number = block;
    reward.block_timestamp = time;
    reward.apr = apr;
    reward
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: No growth means a zero rate
    #[test]
    fn prop_unchanged_totals_give_zero_rate(
        value in 1u128..u128::MAX,
        shares in 1u128..u128::MAX,
        elapsed in 1u64..u64::MAX,
    ) {
        let value = U256::from(value);
        let shares = U256::from(shares);
        prop_assert_eq!(annualized_rate(value, value, shares, shares, U256::from(elapsed)), 0.0);
    }

    /// Property: Doubling at any scale gives the same rate
    ///
    /// Share counts stay below 10^17 per unit of value, which keeps the
    /// pre-rebase share rate above `SECONDS_PER_YEAR * 100`.
    #[test]
    fn prop_rate_is_scale_invariant(
        value in 1u64..1_000_000_000_000,
        shares in 1u64..=100_000_000_000_000_000,
        scale_exp in 1usize..=6,
        elapsed in 1u64..100_000_000,
    ) {
        let shares = U256::from(shares);
        let scale = U256::from(10u64).pow(U256::from(scale_exp));
        let v = U256::from(value);
        let two = U256::from(2u64);

        let small = annualized_rate(v, v * two, shares, shares, U256::from(elapsed));
        let large = annualized_rate(v * scale, v * scale * two, shares, shares, U256::from(elapsed));
        prop_assert_eq!(small, large);
    }

    /// Property: A part of a whole is at most 10000 basis points
    #[test]
    fn prop_basis_points_bounded(whole in 0u128..u128::MAX, fraction in 0.0f64..=1.0) {
        let part = (whole as f64 * fraction) as u128;
        let part = part.min(whole);
        let bp = basis_points(U256::from(part), U256::from(whole));
        prop_assert!(bp <= U256::from(math::BASIS_POINTS));
    }

    /// Property: Identical queries against an unmodified store are identical
    #[test]
    fn prop_query_is_deterministic(
        rows in prop::collection::vec((0u64..50, 0u64..50, -10.0f64..10.0), 0..40),
        skip in 0usize..10,
        limit in 1usize..20,
        by_rate in any::<bool>(),
        desc in any::<bool>(),
    ) {
        let mut store = EntityStore::new();
        for (i, (block, time, apr)) in rows.iter().enumerate() {
            store.put(reward(i, *block, *time, *apr)).unwrap();
        }

        let query = RewardQuery::new()
            .skip(skip)
            .limit(limit)
            .order(
                if by_rate { OrderBy::Rate } else { OrderBy::Time },
                if desc { Direction::Desc } else { Direction::Asc },
            );
        let limits = Config::default().query;

        let first: Vec<B256> = query_rewards(&store, &query, &limits).iter().map(|r| r.id).collect();
        let second: Vec<B256> = query_rewards(&store, &query, &limits).iter().map(|r| r.id).collect();
        prop_assert_eq!(first, second);
    }

    /// Property: Holder positions always sum to the shares minted to them
    #[test]
    fn prop_shares_are_conserved(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let (sim, _) = replay(&ops);

        let held = HOLDERS
            .iter()
            .map(|h| sim.store().shares_of(h))
            .fold(I256::ZERO, |sum, s| sum + s);
        prop_assert_eq!(held, math::signed(sim.totals().share_units));
    }

    /// Property: Replaying the same records gives byte-identical results
    #[test]
    fn prop_deterministic_replay(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let (_, first) = replay(&ops);
        let (_, second) = replay(&ops);
        prop_assert_eq!(first, second);
    }
}
