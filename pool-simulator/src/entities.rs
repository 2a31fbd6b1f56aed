//! Entities derived by the simulator
//!
//! Cumulative entities (`Totals`, `Shares`) are updated in place across
//! transactions. Everything else is written once and never modified.
//! References between entities are plain identifiers.

use crate::math;
use crate::types::EventKey;
use alloy_primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};

/// Pool-wide totals (singleton)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Pooled value backing all shares
    pub pooled_value: U256,
    /// Outstanding share units
    pub share_units: U256,
}

impl Totals {
    /// Create totals
    pub fn new(pooled_value: U256, share_units: U256) -> Self {
        Self {
            pooled_value,
            share_units,
        }
    }

    /// Nothing recorded yet
    pub fn is_zero(&self) -> bool {
        self.pooled_value.is_zero() && self.share_units.is_zero()
    }

    /// Token balance of a share position at these totals
    pub fn balance_of(&self, shares: I256) -> I256 {
        math::token_balance(shares, self.pooled_value, self.share_units)
    }
}

/// Per-holder share position
///
/// `shares` is the seeded starting balance plus every delta applied since, and
/// may be negative when the run starts mid-history without a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shares {
    /// Holder
    pub holder: Address,
    /// Current position
    pub shares: I256,
    /// Seeded starting balance
    pub starting: I256,
}

impl Shares {
    /// Zero position
    pub fn new(holder: Address) -> Self {
        Self {
            holder,
            shares: I256::ZERO,
            starting: I256::ZERO,
        }
    }

    /// Net change since the run started
    pub fn delta(&self) -> I256 {
        self.shares.saturating_sub(self.starting)
    }

    /// Add shares
    pub fn credit(&mut self, amount: U256) {
        self.shares = self.shares.saturating_add(math::signed(amount));
    }

    /// Remove shares
    pub fn debit(&mut self, amount: U256) {
        self.shares = self.shares.saturating_sub(math::signed(amount));
    }
}

/// Reward breakdown of one profitable rebase (keyed by transaction hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Transaction hash
    pub id: B256,
    /// Block number
    pub block_number: u64,
    /// Block timestamp
    pub block_timestamp: u64,
    /// Transaction position in block
    pub transaction_index: u64,
    /// Position of the distribution event
    pub log_index: u64,

    /// Pooled value before the rebase
    pub pooled_value_before: U256,
    /// Pooled value after the rebase
    pub pooled_value_after: U256,
    /// Shares before the rebase
    pub shares_before: U256,
    /// Shares after the rebase
    pub shares_after: U256,
    /// Seconds since the previous report
    pub time_elapsed: U256,

    /// Shares minted as protocol fee
    pub shares_minted_as_fees: U256,
    /// Execution-layer rewards included in the report
    pub execution_layer_rewards: U256,
    /// Gross rewards before fees
    pub total_rewards_with_fees: U256,
    /// Rewards left to holders after fees
    pub total_rewards: U256,

    /// Treasury fee plus operator fee
    pub total_fee: U256,
    /// Fee minted to the treasury (token value)
    pub treasury_fee: U256,
    /// Fee minted to operator modules (token value)
    pub operators_fee: U256,
    /// Shares minted to the treasury
    pub shares_to_treasury: U256,
    /// Shares minted to operator modules
    pub shares_to_operators: U256,

    /// Total fee in basis points of gross rewards
    pub fee_basis: U256,
    /// Treasury share of the fee in basis points
    pub treasury_fee_basis_points: U256,
    /// Operator share of the fee in basis points
    pub operators_fee_basis_points: U256,

    /// Rate from raw totals
    pub apr_raw: f64,
    /// Rate before fees
    pub apr_before_fees: f64,
    /// Reported rate
    pub apr: f64,
    /// Classification of the rate calculation
    pub apr_class: math::RateClass,
}

impl Reward {
    /// Empty breakdown for a rebase transaction
    pub fn new(id: B256) -> Self {
        Self {
            id,
            block_number: 0,
            block_timestamp: 0,
            transaction_index: 0,
            log_index: 0,
            pooled_value_before: U256::ZERO,
            pooled_value_after: U256::ZERO,
            shares_before: U256::ZERO,
            shares_after: U256::ZERO,
            time_elapsed: U256::ZERO,
            shares_minted_as_fees: U256::ZERO,
            execution_layer_rewards: U256::ZERO,
            total_rewards_with_fees: U256::ZERO,
            total_rewards: U256::ZERO,
            total_fee: U256::ZERO,
            treasury_fee: U256::ZERO,
            operators_fee: U256::ZERO,
            shares_to_treasury: U256::ZERO,
            shares_to_operators: U256::ZERO,
            fee_basis: U256::ZERO,
            treasury_fee_basis_points: U256::ZERO,
            operators_fee_basis_points: U256::ZERO,
            apr_raw: 0.0,
            apr_before_fees: 0.0,
            apr: 0.0,
            apr_class: math::RateClass::Normal,
        }
    }
}

/// One deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// `<tx>-<log index>`
    pub id: EventKey,
    /// Block number
    pub block_number: u64,
    /// Block timestamp
    pub block_timestamp: u64,
    /// Depositor
    pub holder: Address,
    /// Deposited value
    pub amount: U256,
    /// Referral
    pub referral: Option<Address>,
    /// Shares minted for the deposit
    pub shares: U256,
    /// Holder position before
    pub shares_before: I256,
    /// Holder position after
    pub shares_after: I256,
    /// Pooled value before
    pub pooled_value_before: U256,
    /// Pooled value after
    pub pooled_value_after: U256,
    /// Total shares before
    pub total_shares_before: U256,
    /// Total shares after
    pub total_shares_after: U256,
    /// Holder token balance after the deposit
    pub balance_after: I256,
}

/// One value transfer, including mints and burns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// `<tx>-<log index>`
    pub id: EventKey,
    /// Block number
    pub block_number: u64,
    /// Block timestamp
    pub block_timestamp: u64,
    /// Source (null for mints)
    pub from: Address,
    /// Destination (null for burns)
    pub to: Address,
    /// Token value
    pub value: U256,
    /// Share units moved
    pub shares: U256,
    /// Source position before (absent for the null identity)
    pub shares_before_decrease: Option<I256>,
    /// Source position after
    pub shares_after_decrease: Option<I256>,
    /// Destination position before (absent for the null identity)
    pub shares_before_increase: Option<I256>,
    /// Destination position after
    pub shares_after_increase: Option<I256>,
    /// Pooled value at the time
    pub pooled_value: U256,
    /// Total shares at the time
    pub total_shares: U256,
    /// Source token balance after
    pub balance_after_decrease: Option<I256>,
    /// Destination token balance after
    pub balance_after_increase: Option<I256>,
}

impl Transfer {
    /// Null source
    pub fn is_mint(&self) -> bool {
        crate::types::is_null(&self.from)
    }

    /// Null destination
    pub fn is_burn(&self) -> bool {
        crate::types::is_null(&self.to)
    }
}

/// Explicit share burn during withdrawal finalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareBurn {
    /// `<tx>-<log index>`
    pub id: EventKey,
    /// Block number
    pub block_number: u64,
    /// Account whose shares were burnt
    pub account: Address,
    /// Token amount before the rebase
    pub pre_rebase_token_amount: U256,
    /// Token amount after the rebase
    pub post_rebase_token_amount: U256,
    /// Shares burnt
    pub shares_burnt: U256,
}

/// Fee minted to one operator module in one rebase (keyed by tx and module)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerModuleFee {
    /// Reward this fee belongs to
    pub reward: B256,
    /// Receiving module
    pub module: Address,
    /// Token value minted
    pub fee: U256,
}

/// Shares minted to one operator module in one rebase (keyed by tx and module)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerModuleShares {
    /// Reward this entry belongs to
    pub reward: B256,
    /// Receiving module
    pub module: Address,
    /// Shares minted
    pub shares: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_delta_tracks_seed() {
        let mut shares = Shares::new(Address::repeat_byte(1));
        shares.starting = math::signed(U256::from(50));
        shares.shares = shares.starting;

        shares.credit(U256::from(30));
        shares.debit(U256::from(100));

        assert_eq!(shares.shares, -math::signed(U256::from(20)));
        assert_eq!(shares.delta(), -math::signed(U256::from(70)));
    }

    #[test]
    fn test_totals_balance_of() {
        let totals = Totals::new(U256::from(2_000), U256::from(1_000));
        assert_eq!(
            totals.balance_of(math::signed(U256::from(10))),
            math::signed(U256::from(20))
        );
        assert!(Totals::default().is_zero());
    }
}
