//! Simulation run orchestration
//!
//! Ties the store, processor, query layer and metrics together into one
//! owned run. Transactions must be submitted in chain order; each one sees
//! the state left by the previous.
//!
//! # Example
//!
//! ```
//! use pool_simulator::{Config, NoReads, Simulator, TxContext};
//! use alloy_primitives::{B256, U256};
//!
//! let mut sim = Simulator::new(Config::default())?;
//! sim.seed_totals(U256::from(1_000_000u64), U256::from(1_000_000u64));
//!
//! let tx = TxContext {
//!     tx_hash: B256::repeat_byte(1),
//!     block_number: 1,
//!     block_timestamp: 12,
//!     transaction_index: 0,
//! };
//! let result = sim.process(&tx, &[], &NoReads)?;
//! assert_eq!(result.handled, 0);
//! # Ok::<(), pool_simulator::Error>(())
//! ```

use crate::{
    checkpoint::{self, Discrepancy},
    entities::{Reward, Shares, Totals},
    metrics::Metrics,
    processor::{process_transaction, TxResult},
    query::{self, RewardQuery},
    reader::ChainReader,
    store::EntityStore,
    types::{LogRecord, TxContext},
    Config, Result,
};
use alloy_primitives::{Address, B256, U256};

/// One simulation run
#[derive(Debug)]
pub struct Simulator {
    /// Entity store owned by this run
    store: EntityStore,

    /// Configuration
    config: Config,

    /// Run metrics
    metrics: Metrics,
}

impl Simulator {
    /// Start an empty run
    pub fn new(config: Config) -> Result<Self> {
        let metrics = Metrics::new()?;
        tracing::debug!(treasury = %config.contracts.treasury, "Simulator created");
        Ok(Self {
            store: EntityStore::new(),
            config,
            metrics,
        })
    }

    /// Start the run from known totals
    pub fn seed_totals(&mut self, pooled_value: U256, share_units: U256) {
        self.store.seed_totals(pooled_value, share_units);
    }

    /// Start a holder from an authoritative balance
    pub fn seed_holder(&mut self, holder: Address, shares: U256) {
        self.store.seed_holder(holder, shares);
    }

    /// Process one transaction
    pub fn process(
        &mut self,
        tx: &TxContext,
        records: &[LogRecord],
        reader: &dyn ChainReader,
    ) -> Result<TxResult> {
        let result = process_transaction(&mut self.store, tx, records, reader, &self.config)?;
        self.metrics.record_transaction(&result);
        Ok(result)
    }

    /// Compare derived state with authoritative reads
    pub fn checkpoint(&self, reader: &dyn ChainReader, holders: &[Address]) -> Result<Vec<Discrepancy>> {
        checkpoint::reconcile(&self.store, reader, holders)
    }

    /// Drop all derived state; metrics keep counting
    pub fn reset(&mut self) {
        self.store.reset();
    }

    /// Current totals
    pub fn totals(&self) -> Totals {
        self.store.totals()
    }

    /// Position of a holder
    pub fn shares(&self, holder: &Address) -> Option<&Shares> {
        self.store.get::<Shares>(holder)
    }

    /// Reward by transaction hash
    pub fn reward(&self, id: &B256) -> Option<&Reward> {
        query::reward_by_id(&self.store, id)
    }

    /// One page of rewards, with limits from the configuration
    pub fn rewards(&self, query: &RewardQuery) -> Vec<&Reward> {
        query::query_rewards(&self.store, query, &self.config.query)
    }

    /// Number of rewards passing the query's filter
    pub fn count_rewards(&self, query: &RewardQuery) -> usize {
        query::count_rewards(&self.store, query)
    }

    /// Most recent reward by time
    pub fn latest_reward(&self) -> Option<&Reward> {
        query::latest_reward(&self.store)
    }

    /// Rewards in an inclusive block range
    pub fn rewards_in_block_range(&self, from: u64, to: u64) -> Vec<&Reward> {
        query::rewards_in_block_range(&self.store, from, to)
    }

    /// Underlying store
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
