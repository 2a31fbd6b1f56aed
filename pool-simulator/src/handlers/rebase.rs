//! Oracle rebases
//!
//! A rebase is the window `ETHDistributed .. TokenRebased` of one
//! transaction. Burns finalized by the report sit inside the window and are
//! folded in here; fee mints sit there too and feed the reward breakdown.
//!
//! ```text
//! ETHDistributed      <- handled here
//!   SharesBurnt*      <- burn handler, consumed
//!   Transfer(0 -> m)* <- scanned for fees, left to the transfer handler
//!   TransferShares*
//! TokenRebased        <- consumed
//! ```

use super::{
    burn,
    fees::{self, RebaseWindow},
    Context, Effects,
};
use crate::{
    events::{names, EthDistributed, ProtocolEvent, SharesBurnt},
    store::EntityStore,
    warning::Warning,
    window::TxEvents,
    Error, Result,
};

/// Handle an `ETHDistributed` event at `log_index`
pub fn handle(
    ctx: &Context<'_>,
    events: &mut TxEvents,
    store: &mut EntityStore,
    log_index: u64,
    event: &EthDistributed,
) -> Result<Effects> {
    let (rebased_index, rebased) = events
        .find_after(log_index, |candidate| match candidate {
            ProtocolEvent::TokenRebased(r) => Some(r.clone()),
            _ => None,
        })
        .ok_or(Error::MissingPairedEvent {
            event: names::ETH_DISTRIBUTED,
            expected: names::TOKEN_REBASED,
            log_index,
            tx_hash: ctx.tx.tx_hash,
        })?;
    events.consume(rebased_index);

    let mut effects = Effects::none();

    let stored = store.totals();
    if !stored.is_zero()
        && (stored.pooled_value != rebased.pre_total_ether
            || stored.share_units != rebased.pre_total_shares)
    {
        effects.warn(Warning::TotalsStateMismatch {
            log_index,
            stored_pooled_value: stored.pooled_value,
            stored_share_units: stored.share_units,
            event_pooled_value: rebased.pre_total_ether,
            event_share_units: rebased.pre_total_shares,
        });
    }

    {
        let totals = store.totals_mut();
        totals.pooled_value = rebased.post_total_ether;
        totals.share_units = rebased.pre_total_shares;
    }

    let burns: Vec<(u64, SharesBurnt)> = events
        .between(log_index, rebased_index)
        .filter(|log| !events.is_consumed(log.log_index))
        .filter_map(|log| match &log.event {
            ProtocolEvent::SharesBurnt(b) => Some((log.log_index, b.clone())),
            _ => None,
        })
        .collect();

    for (burn_index, burnt) in burns {
        events.consume(burn_index);
        effects.merge(burn::handle(ctx, store, burn_index, &burnt)?);
    }

    store.totals_mut().share_units = rebased.post_total_shares;

    if !event.is_profitable() {
        tracing::debug!(
            log_index,
            pre_cl_balance = %event.pre_cl_balance,
            post_cl_balance = %event.post_cl_balance,
            withdrawals = %event.withdrawals_withdrawn,
            "Non-profitable rebase, no reward"
        );
        return Ok(effects);
    }

    let distribution = fees::distribute(
        ctx,
        events,
        store,
        RebaseWindow {
            distributed_index: log_index,
            rebased_index,
            distributed: event,
            rebased: &rebased,
        },
    )?;
    effects.merge(distribution);

    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        entities::{Reward, ShareBurn},
        events::{build, TokenRebased},
        reader::NoReads,
        types::{LogRecord, TxContext},
    };
    use alloy_primitives::{Address, B256, U256};

    fn tx() -> TxContext {
        TxContext {
            tx_hash: B256::repeat_byte(0x99),
            block_number: 1_000,
            block_timestamp: 10_000,
            transaction_index: 0,
        }
    }

    fn distributed(pre_cl: u64, post_cl: u64) -> EthDistributed {
        EthDistributed {
            report_timestamp: U256::from(10_000),
            pre_cl_balance: U256::from(pre_cl),
            post_cl_balance: U256::from(post_cl),
            withdrawals_withdrawn: U256::ZERO,
            execution_layer_rewards_withdrawn: U256::ZERO,
            post_buffered_ether: U256::ZERO,
        }
    }

    fn rebased(pre_shares: u64, post_shares: u64, post_value: u64) -> TokenRebased {
        TokenRebased {
            report_timestamp: U256::from(10_000),
            time_elapsed: U256::from(86_400),
            pre_total_shares: U256::from(pre_shares),
            pre_total_ether: U256::from(1_000_000),
            post_total_shares: U256::from(post_shares),
            post_total_ether: U256::from(post_value),
            shares_minted_as_fees: U256::ZERO,
        }
    }

    fn run(store: &mut EntityStore, records: &[LogRecord]) -> Result<Effects> {
        let tx = tx();
        let config = Config::default();
        let ctx = Context {
            tx: &tx,
            config: &config,
            reader: &NoReads,
        };
        let mut events = TxEvents::decode(&tx, records, None)?;
        let first = events.logs()[0].clone();
        let ProtocolEvent::EthDistributed(ref event) = first.event else {
            panic!("first record must be ETHDistributed");
        };
        handle(&ctx, &mut events, store, first.log_index, event)
    }

    #[test]
    fn test_non_profitable_rebase_updates_totals_only() {
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(1_000_000), U256::from(1_000_000));

        let effects = run(
            &mut store,
            &[
                LogRecord::new(
                    names::ETH_DISTRIBUTED,
                    1,
                    Address::ZERO,
                    build::eth_distributed(&distributed(5_000, 5_000)),
                ),
                LogRecord::new(
                    names::TOKEN_REBASED,
                    2,
                    Address::ZERO,
                    build::token_rebased(&rebased(1_000_000, 1_000_000, 999_000)),
                ),
            ],
        )
        .unwrap();

        assert!(effects.created.is_empty());
        assert!(effects.warnings.is_empty());
        assert_eq!(store.count::<Reward>(), 0);
        assert_eq!(store.totals().pooled_value, U256::from(999_000));
        assert_eq!(store.totals().share_units, U256::from(1_000_000));
    }

    #[test]
    fn test_burns_inside_window_are_folded_in() {
        let account = Address::repeat_byte(0x31);
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(1_000_000), U256::from(1_000_000));
        store.seed_holder(account, U256::from(500));

        let burnt = SharesBurnt {
            account,
            pre_rebase_token_amount: U256::from(400),
            post_rebase_token_amount: U256::from(400),
            shares_amount: U256::from(400),
        };

        run(
            &mut store,
            &[
                LogRecord::new(
                    names::ETH_DISTRIBUTED,
                    1,
                    Address::ZERO,
                    build::eth_distributed(&distributed(5_000, 5_000)),
                ),
                LogRecord::new(names::SHARES_BURNT, 2, Address::ZERO, build::shares_burnt(&burnt)),
                LogRecord::new(
                    names::TOKEN_REBASED,
                    3,
                    Address::ZERO,
                    build::token_rebased(&rebased(1_000_000, 999_600, 1_000_000)),
                ),
            ],
        )
        .unwrap();

        assert_eq!(store.count::<ShareBurn>(), 1);
        assert_eq!(store.totals().share_units, U256::from(999_600));
        assert_eq!(store.shares_of(&account), crate::math::signed(U256::from(100)));
    }

    #[test]
    fn test_stale_totals_warn() {
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(7), U256::from(7));

        let effects = run(
            &mut store,
            &[
                LogRecord::new(
                    names::ETH_DISTRIBUTED,
                    1,
                    Address::ZERO,
                    build::eth_distributed(&distributed(5_000, 5_000)),
                ),
                LogRecord::new(
                    names::TOKEN_REBASED,
                    2,
                    Address::ZERO,
                    build::token_rebased(&rebased(1_000_000, 1_000_000, 1_000_000)),
                ),
            ],
        )
        .unwrap();

        assert_eq!(effects.warnings.len(), 1);
        assert_eq!(effects.warnings[0].code(), "totals-state-mismatch");
    }

    #[test]
    fn test_missing_token_rebased_is_fatal() {
        let mut store = EntityStore::new();
        let err = run(
            &mut store,
            &[LogRecord::new(
                names::ETH_DISTRIBUTED,
                1,
                Address::ZERO,
                build::eth_distributed(&distributed(5_000, 6_000)),
            )],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingPairedEvent {
                expected: names::TOKEN_REBASED,
                ..
            }
        ));
    }
}
