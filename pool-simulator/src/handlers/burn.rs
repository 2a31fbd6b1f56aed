//! Share burns

use super::{transfer, Context, Created, Effects};
use crate::{
    entities::ShareBurn,
    events::SharesBurnt,
    store::EntityStore,
    types::NULL_ADDRESS,
    warning::Warning,
    Result,
};
use alloy_primitives::U256;

/// Handle a `SharesBurnt` event at `log_index`, inside a rebase window or not
///
/// Burns the shares from the totals and from the account, and records both a
/// [`ShareBurn`] and a burn transfer worth the post-rebase token amount.
pub fn handle(
    ctx: &Context<'_>,
    store: &mut EntityStore,
    log_index: u64,
    event: &SharesBurnt,
) -> Result<Effects> {
    let mut effects = Effects::none();

    let totals = store.totals_mut();
    let stored = totals.share_units;
    match stored.checked_sub(event.shares_amount) {
        Some(remaining) => totals.share_units = remaining,
        None => {
            totals.share_units = U256::ZERO;
            effects.warn(Warning::TotalsUnderflow {
                log_index,
                account: event.account,
                stored_share_units: stored,
                burnt: event.shares_amount,
            });
        }
    }

    let burn = ShareBurn {
        id: ctx.tx.key(log_index),
        block_number: ctx.tx.block_number,
        account: event.account,
        pre_rebase_token_amount: event.pre_rebase_token_amount,
        post_rebase_token_amount: event.post_rebase_token_amount,
        shares_burnt: event.shares_amount,
    };
    store.put(burn.clone())?;

    tracing::debug!(
        id = %burn.id,
        account = %event.account,
        shares = %event.shares_amount,
        "Shares burnt"
    );

    let transfer = transfer::apply(
        ctx,
        store,
        log_index,
        event.account,
        NULL_ADDRESS,
        event.post_rebase_token_amount,
        event.shares_amount,
    )?;

    effects.created(Created::ShareBurn(burn));
    transfer::record(&mut effects, transfer);
    Ok(effects)
}
