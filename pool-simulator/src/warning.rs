//! Non-fatal consistency warnings
//!
//! Raised when two independently derivable values disagree. Processing always
//! continues with the event-sourced value.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consistency warning collected alongside an otherwise valid result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Stored totals disagree with the pre-values carried by a rebase
    TotalsStateMismatch {
        /// Position of the rebase event
        log_index: u64,
        /// Stored pooled value
        stored_pooled_value: U256,
        /// Stored share units
        stored_share_units: U256,
        /// Pooled value reported by the event
        event_pooled_value: U256,
        /// Share units reported by the event
        event_share_units: U256,
    },

    /// Minted fee shares differ from treasury plus operator shares
    FeeSharesMismatch {
        /// Reward id
        reward: B256,
        /// Shares minted as fees
        minted: U256,
        /// Shares to treasury
        to_treasury: U256,
        /// Shares to operators
        to_operators: U256,
    },

    /// Total fee differs from treasury plus operator fee, or their sum overflows
    FeeTotalMismatch {
        /// Reward id
        reward: B256,
        /// Total fee
        total: U256,
        /// Treasury fee
        treasury: U256,
        /// Operators fee
        operators: U256,
    },

    /// Per-module fee entities do not sum to the reward's operator fee
    ModuleFeeSumMismatch {
        /// Reward id
        reward: B256,
        /// Aggregate on the reward
        aggregate: U256,
        /// Sum over module entities
        modules: U256,
    },

    /// Per-module share entities do not sum to the reward's operator shares
    ModuleSharesSumMismatch {
        /// Reward id
        reward: B256,
        /// Aggregate on the reward
        aggregate: U256,
        /// Sum over module entities
        modules: U256,
    },

    /// A share decrement exceeded the stored total and was clamped at zero
    TotalsUnderflow {
        /// Position of the burn
        log_index: u64,
        /// Account whose shares were burnt
        account: Address,
        /// Stored total before the burn
        stored_share_units: U256,
        /// Shares burnt
        burnt: U256,
    },
}

impl Warning {
    /// Short machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Warning::TotalsStateMismatch { .. } => "totals-state-mismatch",
            Warning::FeeSharesMismatch { .. } => "fee-shares-mismatch",
            Warning::FeeTotalMismatch { .. } => "fee-total-mismatch",
            Warning::ModuleFeeSumMismatch { .. } => "module-fee-sum-mismatch",
            Warning::ModuleSharesSumMismatch { .. } => "module-shares-sum-mismatch",
            Warning::TotalsUnderflow { .. } => "totals-underflow",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TotalsStateMismatch {
                log_index,
                stored_pooled_value,
                stored_share_units,
                event_pooled_value,
                event_share_units,
            } => write!(
                f,
                "{} at log {}: stored ({}, {}) vs event ({}, {})",
                self.code(),
                log_index,
                stored_pooled_value,
                stored_share_units,
                event_pooled_value,
                event_share_units
            ),
            Warning::FeeSharesMismatch {
                reward,
                minted,
                to_treasury,
                to_operators,
            } => write!(
                f,
                "{} in {}: minted {} != treasury {} + operators {}",
                self.code(),
                reward,
                minted,
                to_treasury,
                to_operators
            ),
            Warning::FeeTotalMismatch {
                reward,
                total,
                treasury,
                operators,
            } => write!(
                f,
                "{} in {}: total {} != treasury {} + operators {}",
                self.code(),
                reward,
                total,
                treasury,
                operators
            ),
            Warning::ModuleFeeSumMismatch {
                reward,
                aggregate,
                modules,
            }
            | Warning::ModuleSharesSumMismatch {
                reward,
                aggregate,
                modules,
            } => write!(
                f,
                "{} in {}: aggregate {} != module sum {}",
                self.code(),
                reward,
                aggregate,
                modules
            ),
            Warning::TotalsUnderflow {
                log_index,
                account,
                stored_share_units,
                burnt,
            } => write!(
                f,
                "{} at log {}: burning {} from {} with only {} stored",
                self.code(),
                log_index,
                burnt,
                account,
                stored_share_units
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display_carries_code() {
        let warning = Warning::FeeSharesMismatch {
            reward: B256::ZERO,
            minted: U256::from(10),
            to_treasury: U256::from(4),
            to_operators: U256::from(5),
        };
        let text = warning.to_string();
        assert!(text.starts_with("fee-shares-mismatch"));
        assert!(text.contains("minted 10"));
    }
}
