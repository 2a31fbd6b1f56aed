//! Transaction processor
//!
//! Runs every modeled event of one transaction through its handler, in log
//! order, and collects what happened into a [`TxResult`].
//!
//! # Invariants
//!
//! - Log positions are strictly ascending, otherwise nothing is processed
//! - Each position is handled at most once (look-ahead claims are skipped)
//! - Same starting store + same records = byte-identical serialized result

use crate::{
    config::Config,
    entities::{PerModuleFee, PerModuleShares, Reward, ShareBurn, Shares, Submission, Totals, Transfer},
    events::ProtocolEvent,
    handlers::{burn, external, rebase, submission, transfer, Context, Created, Effects},
    reader::ChainReader,
    store::EntityStore,
    types::{LogRecord, TxContext},
    warning::Warning,
    window::TxEvents,
    Result,
};
use alloy_primitives::{Address, B256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outcome of one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxResult {
    /// Transaction hash
    pub tx_hash: B256,
    /// Block number
    pub block_number: u64,
    /// Records supplied
    pub event_count: usize,
    /// Events dispatched to a handler
    pub handled: usize,
    /// Records from other contracts or with unmodeled names
    pub ignored: usize,

    /// Deposits created
    pub submissions: Vec<Submission>,
    /// Transfers created, including mints and burns
    pub transfers: Vec<Transfer>,
    /// Share burns created
    pub share_burns: Vec<ShareBurn>,
    /// Rewards created
    pub rewards: Vec<Reward>,
    /// Per-module fees created
    pub module_fees: Vec<PerModuleFee>,
    /// Per-module shares created
    pub module_shares: Vec<PerModuleShares>,

    /// Post-transaction position of every touched holder
    pub holders: IndexMap<Address, Shares>,
    /// Totals after the transaction, if they exist
    pub totals: Option<Totals>,
    /// Consistency warnings in the order they were raised
    pub warnings: Vec<Warning>,
}

impl TxResult {
    fn new(tx: &TxContext, event_count: usize) -> Self {
        Self {
            tx_hash: tx.tx_hash,
            block_number: tx.block_number,
            event_count,
            handled: 0,
            ignored: 0,
            submissions: Vec::new(),
            transfers: Vec::new(),
            share_burns: Vec::new(),
            rewards: Vec::new(),
            module_fees: Vec::new(),
            module_shares: Vec::new(),
            holders: IndexMap::new(),
            totals: None,
            warnings: Vec::new(),
        }
    }

    /// Number of entities created
    pub fn created(&self) -> usize {
        self.submissions.len()
            + self.transfers.len()
            + self.share_burns.len()
            + self.rewards.len()
            + self.module_fees.len()
            + self.module_shares.len()
    }

    fn absorb(&mut self, effects: Effects, store: &EntityStore) {
        for entity in effects.created {
            match entity {
                Created::Submission(e) => self.submissions.push(e),
                Created::Transfer(e) => self.transfers.push(e),
                Created::ShareBurn(e) => self.share_burns.push(e),
                Created::Reward(e) => self.rewards.push(e),
                Created::ModuleFee(e) => self.module_fees.push(e),
                Created::ModuleShares(e) => self.module_shares.push(e),
            }
        }

        for holder in effects.touched {
            if let Some(position) = store.get::<Shares>(&holder) {
                self.holders.insert(holder, *position);
            }
        }

        self.totals = store.recorded_totals();
        self.warnings = effects.warnings;
    }
}

/// Process one transaction's records against `store`
///
/// A hard error aborts the transaction. Mutations made before the error are
/// kept, so the store must be treated as suspect afterwards.
pub fn process_transaction(
    store: &mut EntityStore,
    tx: &TxContext,
    records: &[LogRecord],
    reader: &dyn ChainReader,
    config: &Config,
) -> Result<TxResult> {
    let mut events = TxEvents::decode(tx, records, config.contracts.token)?;
    let ctx = Context { tx, config, reader };

    let mut result = TxResult::new(tx, records.len());
    result.ignored = events.ignored();

    let mut effects = Effects::none();

    for position in 0..events.logs().len() {
        let log = events.logs()[position].clone();
        if events.is_consumed(log.log_index) {
            continue;
        }

        let outcome = match &log.event {
            ProtocolEvent::Submitted(event) => {
                submission::handle(&ctx, &mut events, store, log.log_index, event)?
            }
            ProtocolEvent::Transfer(event) => {
                transfer::handle(&ctx, &mut events, store, log.log_index, event)?
            }
            ProtocolEvent::EthDistributed(event) => {
                rebase::handle(&ctx, &mut events, store, log.log_index, event)?
            }
            ProtocolEvent::SharesBurnt(event) => burn::handle(&ctx, store, log.log_index, event)?,
            ProtocolEvent::ExternalSharesMinted(event) => {
                external::minted(&ctx, store, log.log_index, event)?
            }
            ProtocolEvent::ExternalSharesBurnt(event) => {
                external::burnt(&ctx, store, log.log_index, event)?
            }
            ProtocolEvent::TransferShares(_) | ProtocolEvent::TokenRebased(_) => {
                tracing::trace!(log_index = log.log_index, "Unpaired event skipped");
                continue;
            }
        };

        result.handled += 1;
        effects.merge(outcome);
    }

    result.absorb(effects, store);

    tracing::info!(
        tx_hash = %tx.tx_hash,
        block = tx.block_number,
        events = result.event_count,
        handled = result.handled,
        created = result.created(),
        warnings = result.warnings.len(),
        "Transaction processed"
    );

    Ok(result)
}
