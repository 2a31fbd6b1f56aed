//! Fee distribution of a profitable rebase
//!
//! Fee shares are minted between `ETHDistributed` and `TokenRebased` as
//! ordinary mint transfers. Mints to the treasury make up the treasury fee;
//! every other mint destination is a staking module and its mints make up
//! the operator fee.
//!
//! The mints are only scanned here, never consumed: the generic transfer
//! handler still credits the receivers when the processor reaches them.

use super::{Context, Created, Effects};
use crate::{
    entities::{PerModuleFee, PerModuleShares, Reward},
    events::{names, EthDistributed, ProtocolEvent, TokenRebased, TokenTransfer},
    math,
    store::EntityStore,
    types::{is_null, NULL_ADDRESS},
    warning::Warning,
    window::TxEvents,
    Error, Result,
};
use alloy_primitives::{Address, U256};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Window of one rebase: `ETHDistributed` position and the paired `TokenRebased`
#[derive(Debug, Clone, Copy)]
pub struct RebaseWindow<'e> {
    /// Position of `ETHDistributed`
    pub distributed_index: u64,
    /// Position of `TokenRebased`
    pub rebased_index: u64,
    /// Accounting event
    pub distributed: &'e EthDistributed,
    /// Totals event
    pub rebased: &'e TokenRebased,
}

#[derive(Debug, Default)]
struct Split {
    treasury_fee: U256,
    shares_to_treasury: U256,
    operators_fee: U256,
    shares_to_operators: U256,
    total_fee: U256,
}

/// Build and store the [`Reward`] of a profitable rebase
pub fn distribute(
    ctx: &Context<'_>,
    events: &TxEvents,
    store: &mut EntityStore,
    window: RebaseWindow<'_>,
) -> Result<Effects> {
    let reward_id = ctx.tx.tx_hash;
    let treasury = ctx.config.contracts.treasury;
    let mut effects = Effects::none();

    let mints: Vec<(u64, TokenTransfer)> = events
        .between(window.distributed_index, window.rebased_index)
        .filter(|log| !events.is_consumed(log.log_index))
        .filter_map(|log| match &log.event {
            ProtocolEvent::Transfer(t) if is_null(&t.from) => Some((log.log_index, t.clone())),
            _ => None,
        })
        .collect();

    let mut claimed = BTreeSet::new();
    let mut split = Split::default();
    let mut modules: IndexMap<Address, (U256, U256)> = IndexMap::new();

    for (index, mint) in mints {
        let (shares_index, shares) = events
            .paired_shares(
                index,
                NULL_ADDRESS,
                mint.to,
                Some(window.rebased_index),
                &claimed,
            )
            .ok_or(Error::MissingPairedEvent {
                event: names::TRANSFER,
                expected: names::TRANSFER_SHARES,
                log_index: index,
                tx_hash: ctx.tx.tx_hash,
            })?;
        claimed.insert(shares_index);

        split.total_fee = split.total_fee.saturating_add(mint.value);

        if mint.to == treasury {
            split.treasury_fee = split.treasury_fee.saturating_add(mint.value);
            split.shares_to_treasury = split.shares_to_treasury.saturating_add(shares);
            continue;
        }

        split.operators_fee = split.operators_fee.saturating_add(mint.value);
        split.shares_to_operators = split.shares_to_operators.saturating_add(shares);

        let (fee, module_shares) = modules.entry(mint.to).or_insert((U256::ZERO, U256::ZERO));
        *fee = fee.saturating_add(mint.value);
        *module_shares = module_shares.saturating_add(shares);
    }

    for (module, (fee, shares)) in modules {
        let fee = PerModuleFee {
            reward: reward_id,
            module,
            fee,
        };
        store.put(fee.clone())?;
        effects.created(Created::ModuleFee(fee));

        let entry = PerModuleShares {
            reward: reward_id,
            module,
            shares,
        };
        store.put(entry.clone())?;
        effects.created(Created::ModuleShares(entry));
    }

    let reward = build_reward(ctx, window, &split);
    check(store, &reward, &mut effects);
    store.put(reward.clone())?;

    tracing::debug!(
        reward = %reward.id,
        total_rewards = %reward.total_rewards,
        total_fee = %reward.total_fee,
        apr = reward.apr,
        "Reward recorded"
    );

    effects.created(Created::Reward(reward));
    Ok(effects)
}

fn build_reward(ctx: &Context<'_>, window: RebaseWindow<'_>, split: &Split) -> Reward {
    let rebased = window.rebased;
    let with_fees = window.distributed.total_rewards_with_fees();

    let rate = math::annualized_rate_detailed(
        rebased.pre_total_ether,
        rebased.post_total_ether,
        rebased.pre_total_shares,
        rebased.post_total_shares,
        rebased.time_elapsed,
        &ctx.config.rates.params(),
    );

    let mut reward = Reward::new(ctx.tx.tx_hash);
    reward.block_number = ctx.tx.block_number;
    reward.block_timestamp = ctx.tx.block_timestamp;
    reward.transaction_index = ctx.tx.transaction_index;
    reward.log_index = window.distributed_index;

    reward.pooled_value_before = rebased.pre_total_ether;
    reward.pooled_value_after = rebased.post_total_ether;
    reward.shares_before = rebased.pre_total_shares;
    reward.shares_after = rebased.post_total_shares;
    reward.time_elapsed = rebased.time_elapsed;

    reward.shares_minted_as_fees = rebased.shares_minted_as_fees;
    reward.execution_layer_rewards = window.distributed.execution_layer_rewards_withdrawn;
    reward.total_rewards_with_fees = with_fees;
    reward.total_rewards = with_fees.saturating_sub(split.total_fee);

    reward.total_fee = split.total_fee;
    reward.treasury_fee = split.treasury_fee;
    reward.operators_fee = split.operators_fee;
    reward.shares_to_treasury = split.shares_to_treasury;
    reward.shares_to_operators = split.shares_to_operators;

    reward.fee_basis = math::basis_points(split.total_fee, with_fees);
    reward.treasury_fee_basis_points = math::basis_points(split.treasury_fee, split.total_fee);
    reward.operators_fee_basis_points = math::basis_points(split.operators_fee, split.total_fee);

    // All three coincide for the modeled protocol version.
    reward.apr_raw = rate.rate;
    reward.apr_before_fees = rate.rate;
    reward.apr = rate.rate;
    reward.apr_class = rate.class;

    reward
}

fn check(store: &EntityStore, reward: &Reward, effects: &mut Effects) {
    let split_shares = reward
        .shares_to_treasury
        .saturating_add(reward.shares_to_operators);
    if reward.shares_minted_as_fees != split_shares {
        effects.warn(Warning::FeeSharesMismatch {
            reward: reward.id,
            minted: reward.shares_minted_as_fees,
            to_treasury: reward.shares_to_treasury,
            to_operators: reward.shares_to_operators,
        });
    }

    // Both sides come from the same mints, so this only trips when the
    // category sums overflow while the running total saturated.
    if reward.treasury_fee.checked_add(reward.operators_fee) != Some(reward.total_fee) {
        effects.warn(Warning::FeeTotalMismatch {
            reward: reward.id,
            total: reward.total_fee,
            treasury: reward.treasury_fee,
            operators: reward.operators_fee,
        });
    }

    let module_fees = store
        .module_fees_for(&reward.id)
        .into_iter()
        .fold(U256::ZERO, |sum, fee| sum.saturating_add(fee.fee));
    if module_fees != reward.operators_fee {
        effects.warn(Warning::ModuleFeeSumMismatch {
            reward: reward.id,
            aggregate: reward.operators_fee,
            modules: module_fees,
        });
    }

    let module_shares = store
        .module_shares_for(&reward.id)
        .into_iter()
        .fold(U256::ZERO, |sum, entry| sum.saturating_add(entry.shares));
    if module_shares != reward.shares_to_operators {
        effects.warn(Warning::ModuleSharesSumMismatch {
            reward: reward.id,
            aggregate: reward.shares_to_operators,
            modules: module_shares,
        });
    }
}
