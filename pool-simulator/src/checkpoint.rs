//! Checkpoint reconciliation
//!
//! Compares the event-derived state against authoritative reads taken at the
//! same block. A correct run produces no discrepancies at any checkpoint.

use crate::{math, reader::ChainReader, store::EntityStore, Result};
use alloy_primitives::{Address, I256};
use serde::{Deserialize, Serialize};

/// What disagreed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    /// Totals pooled value
    PooledValueMismatch,
    /// Totals share units
    TotalSharesMismatch,
    /// A holder's share position
    HolderSharesMismatch,
}

/// One disagreement between derived and authoritative state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Kind
    pub discrepancy_type: DiscrepancyType,
    /// Holder, for position mismatches
    pub holder: Option<Address>,
    /// Authoritative value
    pub expected: I256,
    /// Event-derived value
    pub actual: I256,
    /// `actual - expected`
    pub difference: I256,
}

impl Discrepancy {
    fn new(discrepancy_type: DiscrepancyType, holder: Option<Address>, expected: I256, actual: I256) -> Self {
        Self {
            discrepancy_type,
            holder,
            expected,
            actual,
            difference: actual.saturating_sub(expected),
        }
    }
}

/// Compare totals and the listed holders against `reader`
///
/// A holder the store never saw counts as a zero position. Unreadable values
/// are errors, not discrepancies.
pub fn reconcile(
    store: &EntityStore,
    reader: &dyn ChainReader,
    holders: &[Address],
) -> Result<Vec<Discrepancy>> {
    let mut found = Vec::new();
    let totals = store.totals();

    let pooled_value = reader.total_pooled_value()?;
    if pooled_value != totals.pooled_value {
        found.push(Discrepancy::new(
            DiscrepancyType::PooledValueMismatch,
            None,
            math::signed(pooled_value),
            math::signed(totals.pooled_value),
        ));
    }

    let total_shares = reader.total_shares()?;
    if total_shares != totals.share_units {
        found.push(Discrepancy::new(
            DiscrepancyType::TotalSharesMismatch,
            None,
            math::signed(total_shares),
            math::signed(totals.share_units),
        ));
    }

    for holder in holders {
        let expected = math::signed(reader.shares_of(holder)?);
        let actual = store.shares_of(holder);
        if expected != actual {
            found.push(Discrepancy::new(
                DiscrepancyType::HolderSharesMismatch,
                Some(*holder),
                expected,
                actual,
            ));
        }
    }

    for discrepancy in &found {
        tracing::warn!(
            kind = ?discrepancy.discrepancy_type,
            holder = ?discrepancy.holder,
            expected = %discrepancy.expected,
            actual = %discrepancy.actual,
            "Checkpoint discrepancy"
        );
    }

    Ok(found)
}
