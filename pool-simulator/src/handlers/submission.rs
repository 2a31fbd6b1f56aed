//! Deposits
//!
//! A `Submitted` event is always followed by the mint pair
//! `Transfer(null -> sender)` / `TransferShares(null -> sender)`. The share
//! transfer carries the minted amount and is mandatory; the token transfer
//! is only looked for before it. Both positions are
//! claimed here and the mint is recorded as a [`Transfer`](crate::entities::Transfer),
//! so the generic transfer handler never sees it.

use super::{transfer, Context, Created, Effects};
use crate::{
    entities::Submission,
    events::{names, ProtocolEvent, Submitted},
    store::EntityStore,
    types::{is_null, NULL_ADDRESS},
    window::TxEvents,
    Error, Result,
};
use alloy_primitives::I256;
use std::collections::BTreeSet;

/// Handle a `Submitted` event at `log_index`
pub fn handle(
    ctx: &Context<'_>,
    events: &mut TxEvents,
    store: &mut EntityStore,
    log_index: u64,
    event: &Submitted,
) -> Result<Effects> {
    let (shares_index, minted) = events
        .paired_shares(log_index, NULL_ADDRESS, event.sender, None, &BTreeSet::new())
        .ok_or(Error::MissingPairedEvent {
            event: names::SUBMITTED,
            expected: names::TRANSFER_SHARES,
            log_index,
            tx_hash: ctx.tx.tx_hash,
        })?;

    // The mint transfer, when present, sits between the deposit and its shares.
    let sender = event.sender;
    let mint = events
        .find_after(log_index, |candidate| match candidate {
            ProtocolEvent::Transfer(t) if is_null(&t.from) && t.to == sender => Some(t.value),
            _ => None,
        })
        .filter(|(index, _)| *index < shares_index);

    events.consume(shares_index);
    let (transfer_index, transfer_value) = match mint {
        Some((index, value)) => {
            events.consume(index);
            (index, value)
        }
        None => (shares_index, event.amount),
    };

    let before = store.totals();
    {
        let totals = store.totals_mut();
        totals.pooled_value = totals.pooled_value.saturating_add(event.amount);
        totals.share_units = totals.share_units.saturating_add(minted);
    }
    let after = store.totals();

    let mint = transfer::apply(
        ctx,
        store,
        transfer_index,
        NULL_ADDRESS,
        sender,
        transfer_value,
        minted,
    )?;

    let shares_before = mint.shares_before_increase.unwrap_or(I256::ZERO);
    let shares_after = mint.shares_after_increase.unwrap_or(I256::ZERO);

    let submission = Submission {
        id: ctx.tx.key(log_index),
        block_number: ctx.tx.block_number,
        block_timestamp: ctx.tx.block_timestamp,
        holder: sender,
        amount: event.amount,
        referral: event.referral,
        shares: minted,
        shares_before,
        shares_after,
        pooled_value_before: before.pooled_value,
        pooled_value_after: after.pooled_value,
        total_shares_before: before.share_units,
        total_shares_after: after.share_units,
        balance_after: after.balance_of(shares_after),
    };
    store.put(submission.clone())?;

    tracing::debug!(
        id = %submission.id,
        holder = %sender,
        amount = %event.amount,
        shares = %minted,
        "Submission recorded"
    );

    let mut effects = Effects::none();
    effects.created(Created::Submission(submission));
    transfer::record(&mut effects, mint);
    Ok(effects)
}
