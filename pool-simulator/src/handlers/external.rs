//! External vault mint and burn
//!
//! Neither event reports the resulting pooled value, so it is taken from the
//! authoritative reader. The receiver's position is credited by the
//! accompanying `Transfer`, not here.

use super::{Context, Effects};
use crate::{
    events::{ExternalSharesBurnt, ExternalSharesMinted},
    store::EntityStore,
    Result,
};

/// Handle `ExternalSharesMinted`
pub fn minted(
    ctx: &Context<'_>,
    store: &mut EntityStore,
    log_index: u64,
    event: &ExternalSharesMinted,
) -> Result<Effects> {
    let pooled_value = ctx.reader.total_pooled_value()?;

    let totals = store.totals_mut();
    totals.share_units = totals.share_units.saturating_add(event.amount_of_shares);
    totals.pooled_value = pooled_value;

    tracing::debug!(
        log_index,
        receiver = %event.receiver,
        shares = %event.amount_of_shares,
        %pooled_value,
        "External shares minted"
    );

    Ok(Effects::none())
}

/// Handle `ExternalSharesBurnt`
///
/// The share total is left alone; the burn is accounted for by the
/// accompanying `SharesBurnt`.
pub fn burnt(
    ctx: &Context<'_>,
    store: &mut EntityStore,
    log_index: u64,
    event: &ExternalSharesBurnt,
) -> Result<Effects> {
    let pooled_value = ctx.reader.total_pooled_value()?;
    store.totals_mut().pooled_value = pooled_value;

    tracing::debug!(
        log_index,
        shares = %event.amount_of_shares,
        %pooled_value,
        "External shares burnt"
    );

    Ok(Effects::none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        reader::{NoReads, SnapshotReader},
        types::TxContext,
        Error,
    };
    use alloy_primitives::{Address, B256, U256};

    fn tx() -> TxContext {
        TxContext {
            tx_hash: B256::repeat_byte(0x11),
            block_number: 9,
            block_timestamp: 90,
            transaction_index: 0,
        }
    }

    #[test]
    fn test_mint_refreshes_value_from_reader() {
        let tx = tx();
        let config = Config::default();
        let reader = SnapshotReader::new().with_pooled_value(U256::from(2_500));
        let ctx = Context {
            tx: &tx,
            config: &config,
            reader: &reader,
        };
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(2_000), U256::from(1_000));

        let event = ExternalSharesMinted {
            receiver: Address::repeat_byte(0xee),
            amount_of_shares: U256::from(250),
            token_amount: U256::from(500),
        };
        minted(&ctx, &mut store, 3, &event).unwrap();

        assert_eq!(store.totals().share_units, U256::from(1_250));
        assert_eq!(store.totals().pooled_value, U256::from(2_500));
    }

    #[test]
    fn test_burn_only_touches_value() {
        let tx = tx();
        let config = Config::default();
        let reader = SnapshotReader::new().with_pooled_value(U256::from(1_500));
        let ctx = Context {
            tx: &tx,
            config: &config,
            reader: &reader,
        };
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(2_000), U256::from(1_000));

        let event = ExternalSharesBurnt {
            amount_of_shares: U256::from(250),
        };
        burnt(&ctx, &mut store, 3, &event).unwrap();

        assert_eq!(store.totals().share_units, U256::from(1_000));
        assert_eq!(store.totals().pooled_value, U256::from(1_500));
    }

    #[test]
    fn test_missing_read_leaves_totals_untouched() {
        let tx = tx();
        let config = Config::default();
        let ctx = Context {
            tx: &tx,
            config: &config,
            reader: &NoReads,
        };
        let mut store = EntityStore::new();
        store.seed_totals(U256::from(2_000), U256::from(1_000));

        let event = ExternalSharesMinted {
            receiver: Address::repeat_byte(0xee),
            amount_of_shares: U256::from(250),
            token_amount: U256::from(500),
        };
        let err = minted(&ctx, &mut store, 3, &event).unwrap_err();

        assert!(matches!(err, Error::MissingAuthoritativeRead(_)));
        assert_eq!(store.totals().share_units, U256::from(1_000));
    }
}
