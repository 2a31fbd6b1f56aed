//! Token transfers
//!
//! Every `Transfer` not already claimed by another handler lands here. The
//! share amount comes from the paired `TransferShares`; older protocol
//! versions may not emit one, in which case the transfer moves zero shares.

use super::{Context, Created, Effects};
use crate::{
    entities::{Shares, Transfer},
    events::TokenTransfer,
    store::EntityStore,
    types::is_null,
    window::TxEvents,
    Result,
};
use alloy_primitives::{Address, U256};
use std::collections::BTreeSet;

/// Handle a `Transfer` event at `log_index`
pub fn handle(
    ctx: &Context<'_>,
    events: &mut TxEvents,
    store: &mut EntityStore,
    log_index: u64,
    event: &TokenTransfer,
) -> Result<Effects> {
    let shares = match events.paired_shares(log_index, event.from, event.to, None, &BTreeSet::new()) {
        Some((pair_index, shares)) => {
            events.consume(pair_index);
            shares
        }
        None => {
            tracing::debug!(
                log_index,
                from = %event.from,
                to = %event.to,
                "Transfer without paired share transfer, assuming zero shares"
            );
            U256::ZERO
        }
    };

    let mut effects = Effects::none();
    let transfer = apply(ctx, store, log_index, event.from, event.to, event.value, shares)?;
    record(&mut effects, transfer);
    Ok(effects)
}

/// Move `shares` between two holders and persist the resulting [`Transfer`]
///
/// The null identity has no position and is skipped. A self-transfer records
/// balances but applies no delta. Token balances are derived from the totals
/// as they stand when this is called.
pub(crate) fn apply(
    ctx: &Context<'_>,
    store: &mut EntityStore,
    log_index: u64,
    from: Address,
    to: Address,
    value: U256,
    shares: U256,
) -> Result<Transfer> {
    let self_transfer = from == to;

    let (before_decrease, after_decrease) = if is_null(&from) {
        (None, None)
    } else {
        let position = store.get_or_create::<Shares>(&from);
        let before = position.shares;
        if !self_transfer {
            position.debit(shares);
        }
        (Some(before), Some(position.shares))
    };

    let (before_increase, after_increase) = if is_null(&to) {
        (None, None)
    } else {
        let position = store.get_or_create::<Shares>(&to);
        let before = position.shares;
        if !self_transfer {
            position.credit(shares);
        }
        (Some(before), Some(position.shares))
    };

    let totals = store.totals();
    let transfer = Transfer {
        id: ctx.tx.key(log_index),
        block_number: ctx.tx.block_number,
        block_timestamp: ctx.tx.block_timestamp,
        from,
        to,
        value,
        shares,
        shares_before_decrease: before_decrease,
        shares_after_decrease: after_decrease,
        shares_before_increase: before_increase,
        shares_after_increase: after_increase,
        pooled_value: totals.pooled_value,
        total_shares: totals.share_units,
        balance_after_decrease: after_decrease.map(|s| totals.balance_of(s)),
        balance_after_increase: after_increase.map(|s| totals.balance_of(s)),
    };

    store.put(transfer.clone())?;

    tracing::debug!(
        id = %transfer.id,
        %from,
        %to,
        %value,
        %shares,
        "Transfer recorded"
    );

    Ok(transfer)
}

/// Add a transfer and its non-null endpoints to `effects`
pub(crate) fn record(effects: &mut Effects, transfer: Transfer) {
    if !is_null(&transfer.from) {
        effects.touched(transfer.from);
    }
    if !is_null(&transfer.to) {
        effects.touched(transfer.to);
    }
    effects.created(Created::Transfer(transfer));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        events::{build, names},
        math::signed,
        reader::NoReads,
        types::{LogRecord, TxContext},
    };
    use alloy_primitives::{B256, I256};

    fn tx() -> TxContext {
        TxContext {
            tx_hash: B256::repeat_byte(9),
            block_number: 100,
            block_timestamp: 1_000,
            transaction_index: 0,
        }
    }

    fn run(store: &mut EntityStore, records: Vec<LogRecord>) -> Effects {
        let tx = tx();
        let config = Config::default();
        let ctx = Context {
            tx: &tx,
            config: &config,
            reader: &NoReads,
        };
        let mut events = TxEvents::decode(&tx, &records, None).unwrap();
        let first = events.logs()[0].clone();
        match first.event {
            crate::events::ProtocolEvent::Transfer(ref event) => {
                handle(&ctx, &mut events, store, first.log_index, event).unwrap()
            }
            _ => panic!("first record must be a transfer"),
        }
    }

    #[test]
    fn test_transfer_moves_paired_shares() {
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(2_000), U256::from(1_000));
        store.seed_holder(alice, U256::from(100));

        let effects = run(
            &mut store,
            vec![
                LogRecord::new(names::TRANSFER, 1, Address::ZERO, build::transfer(alice, bob, U256::from(80))),
                LogRecord::new(
                    names::TRANSFER_SHARES,
                    2,
                    Address::ZERO,
                    build::transfer_shares(alice, bob, U256::from(40)),
                ),
            ],
        );

        assert_eq!(store.shares_of(&alice), signed(U256::from(60)));
        assert_eq!(store.shares_of(&bob), signed(U256::from(40)));
        assert_eq!(effects.touched, vec![alice, bob]);

        let Created::Transfer(transfer) = &effects.created[0] else {
            panic!("expected transfer");
        };
        assert_eq!(transfer.shares, U256::from(40));
        assert_eq!(transfer.shares_before_decrease, Some(signed(U256::from(100))));
        assert_eq!(transfer.balance_after_increase, Some(signed(U256::from(80))));
    }

    #[test]
    fn test_transfer_without_pair_moves_nothing() {
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let mut store = EntityStore::new();

        let effects = run(
            &mut store,
            vec![LogRecord::new(
                names::TRANSFER,
                1,
                Address::ZERO,
                build::transfer(alice, bob, U256::from(80)),
            )],
        );

        assert_eq!(store.shares_of(&bob), I256::ZERO);
        assert!(effects.warnings.is_empty());
        let Created::Transfer(transfer) = &effects.created[0] else {
            panic!("expected transfer");
        };
        assert_eq!(transfer.shares, U256::ZERO);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let alice = Address::repeat_byte(0xa1);
        let mut store = EntityStore::new();
        store.seed_holder(alice, U256::from(10));

        run(
            &mut store,
            vec![
                LogRecord::new(names::TRANSFER, 1, Address::ZERO, build::transfer(alice, alice, U256::from(5))),
                LogRecord::new(
                    names::TRANSFER_SHARES,
                    2,
                    Address::ZERO,
                    build::transfer_shares(alice, alice, U256::from(5)),
                ),
            ],
        );

        assert_eq!(store.shares_of(&alice), signed(U256::from(10)));
    }
}
