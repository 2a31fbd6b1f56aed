//! Read-only queries over rewards
//!
//! Filter, then a stable sort, then paginate. Ties keep the store's insertion
//! order, so identical queries against an unmodified store always return the
//! same page.

use crate::{config::QueryConfig, entities::Reward, store::EntityStore};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// Block timestamp
    #[default]
    Time,
    /// Block number
    Block,
    /// Block, transaction, then log position
    LogPosition,
    /// Annualized rate
    Rate,
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Reward page request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardQuery {
    /// Entries to skip
    pub skip: usize,
    /// Page size; the configured default when absent
    pub limit: Option<usize>,
    /// Only rewards in blocks strictly above this one
    pub min_block_exclusive: Option<u64>,
    /// Sort key
    pub order_by: OrderBy,
    /// Sort direction
    pub direction: Direction,
}

impl RewardQuery {
    /// Query with default ordering
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the number of entries to skip
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Only rewards after `block`
    pub fn after_block(mut self, block: u64) -> Self {
        self.min_block_exclusive = Some(block);
        self
    }

    /// Set the ordering
    pub fn order(mut self, order_by: OrderBy, direction: Direction) -> Self {
        self.order_by = order_by;
        self.direction = direction;
        self
    }

    fn matches(&self, reward: &Reward) -> bool {
        self.min_block_exclusive
            .map_or(true, |block| reward.block_number > block)
    }
}

fn compare(order_by: OrderBy, a: &Reward, b: &Reward) -> Ordering {
    match order_by {
        OrderBy::Time => a.block_timestamp.cmp(&b.block_timestamp),
        OrderBy::Block => a.block_number.cmp(&b.block_number),
        OrderBy::LogPosition => (a.block_number, a.transaction_index, a.log_index).cmp(&(
            b.block_number,
            b.transaction_index,
            b.log_index,
        )),
        OrderBy::Rate => a.apr.total_cmp(&b.apr),
    }
}

/// One page of rewards
pub fn query_rewards<'s>(
    store: &'s EntityStore,
    query: &RewardQuery,
    limits: &QueryConfig,
) -> Vec<&'s Reward> {
    let mut rewards: Vec<&Reward> = store.iter::<Reward>().filter(|r| query.matches(r)).collect();

    // `sort_by` is stable; reversing the comparison keeps ties in insertion order.
    match query.direction {
        Direction::Asc => rewards.sort_by(|a, b| compare(query.order_by, a, b)),
        Direction::Desc => rewards.sort_by(|a, b| compare(query.order_by, b, a)),
    }

    let limit = query
        .limit
        .unwrap_or(limits.default_limit)
        .min(limits.max_limit);

    rewards.into_iter().skip(query.skip).take(limit).collect()
}

/// Reward by transaction hash
pub fn reward_by_id<'s>(store: &'s EntityStore, id: &B256) -> Option<&'s Reward> {
    store.get::<Reward>(id)
}

/// Number of rewards passing the query's filter; paging is ignored
pub fn count_rewards(store: &EntityStore, query: &RewardQuery) -> usize {
    store.iter::<Reward>().filter(|r| query.matches(r)).count()
}

/// Most recent reward by block time; the earliest inserted wins a tie
pub fn latest_reward(store: &EntityStore) -> Option<&Reward> {
    store.iter::<Reward>().fold(None, |latest, reward| match latest {
        Some(current) if current.block_timestamp >= reward.block_timestamp => Some(current),
        _ => Some(reward),
    })
}

/// Rewards with `from <= block_number <= to`, in insertion order
pub fn rewards_in_block_range(store: &EntityStore, from: u64, to: u64) -> Vec<&Reward> {
    store
        .iter::<Reward>()
        .filter(|r| (from..=to).contains(&r.block_number))
        .collect()
}
