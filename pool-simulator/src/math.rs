//! Fixed-point helpers
//!
//! All arithmetic is integer arithmetic on 256-bit values. The annualized
//! rate converts to `f64` exactly once, after every multiplication and
//! division has happened in scaled integers, so results are bit-for-bit
//! reproducible. The final truncating divisions also absorb the one-unit
//! rounding of the share rates, which keeps proportional growth
//! scale-invariant.
//!
//! ```text
//! share_rate = value * 10^27 / shares
//! rate       = SECONDS_PER_YEAR * (post_rate - pre_rate) * 100 / pre_rate / elapsed
//! ```

use alloy_primitives::{Sign, I256, U256};
use serde::{Deserialize, Serialize};

/// Share rate scale (10^27)
pub const SHARE_RATE_SCALE: U256 = U256::from_limbs([11515845246265065472, 54210108, 0, 0]);

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Basis points in one whole
pub const BASIS_POINTS: u64 = 10_000;

/// Largest rate magnitude reported, in percent
pub const MAX_RATE_PERCENT: u64 = 1_000_000;

/// Pre-rebase share rates below this (scaled by 10^27) are not meaningful
pub const MIN_SHARE_RATE: u64 = 1_000_000_000;

/// Tunables for [`annualized_rate_detailed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateParams {
    /// Clamp for the absolute rate, in percent
    pub max_rate_percent: u64,
    /// Minimum pre-rebase share rate (scaled by 10^27)
    pub min_share_rate: u64,
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            max_rate_percent: MAX_RATE_PERCENT,
            min_share_rate: MIN_SHARE_RATE,
        }
    }
}

/// Which branch the rate calculation took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateClass {
    /// Regular computation
    Normal,
    /// Pre or post share count is zero
    ZeroShares,
    /// No time elapsed
    ZeroElapsed,
    /// Pre-rebase pooled value is zero
    ZeroPreValue,
    /// Pre-rebase share rate below [`RateParams::min_share_rate`]
    BelowThreshold,
    /// Clamped at `+max_rate_percent`
    PositiveOverflow,
    /// Clamped at `-max_rate_percent`
    NegativeOverflow,
}

impl RateClass {
    /// Degenerate inputs resolve to zero
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            RateClass::ZeroShares
                | RateClass::ZeroElapsed
                | RateClass::ZeroPreValue
                | RateClass::BelowThreshold
        )
    }

    /// Result was clamped
    pub fn is_overflow(&self) -> bool {
        matches!(self, RateClass::PositiveOverflow | RateClass::NegativeOverflow)
    }
}

/// Rate plus the classification that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateOutcome {
    /// Annualized rate in percent
    pub rate: f64,
    /// Branch taken
    pub class: RateClass,
}

impl RateOutcome {
    fn degenerate(class: RateClass) -> Self {
        Self { rate: 0.0, class }
    }

    fn clamped(negative: bool, params: &RateParams) -> Self {
        let limit = params.max_rate_percent as f64;
        if negative {
            Self {
                rate: -limit,
                class: RateClass::NegativeOverflow,
            }
        } else {
            Self {
                rate: limit,
                class: RateClass::PositiveOverflow,
            }
        }
    }
}

/// `value * 10^27 / shares`; `None` for zero shares or overflow
pub fn share_rate(value: U256, shares: U256) -> Option<U256> {
    if shares.is_zero() {
        return None;
    }
    value.checked_mul(SHARE_RATE_SCALE).map(|scaled| scaled / shares)
}

/// Annualized rate in percent with default parameters
pub fn annualized_rate(
    pre_value: U256,
    post_value: U256,
    pre_shares: U256,
    post_shares: U256,
    elapsed_seconds: U256,
) -> f64 {
    annualized_rate_detailed(
        pre_value,
        post_value,
        pre_shares,
        post_shares,
        elapsed_seconds,
        &RateParams::default(),
    )
    .rate
}

/// Annualized rate in percent, reporting the edge case that was hit
pub fn annualized_rate_detailed(
    pre_value: U256,
    post_value: U256,
    pre_shares: U256,
    post_shares: U256,
    elapsed_seconds: U256,
    params: &RateParams,
) -> RateOutcome {
    if pre_shares.is_zero() || post_shares.is_zero() {
        return RateOutcome::degenerate(RateClass::ZeroShares);
    }
    if elapsed_seconds.is_zero() {
        return RateOutcome::degenerate(RateClass::ZeroElapsed);
    }
    if pre_value.is_zero() {
        return RateOutcome::degenerate(RateClass::ZeroPreValue);
    }

    // Share rates only overflow for values beyond ~1.1e50.
    let (pre_rate, post_rate) = match (
        share_rate(pre_value, pre_shares),
        share_rate(post_value, post_shares),
    ) {
        (Some(pre), Some(post)) => (pre, post),
        _ => return RateOutcome::clamped(post_value < pre_value, params),
    };

    if pre_rate < U256::from(params.min_share_rate) {
        return RateOutcome::degenerate(RateClass::BelowThreshold);
    }

    let negative = post_rate < pre_rate;
    let diff = if negative {
        pre_rate - post_rate
    } else {
        post_rate - pre_rate
    };

    let numerator = U256::from(SECONDS_PER_YEAR)
        .checked_mul(diff)
        .and_then(|v| v.checked_mul(U256::from(100u64)));
    let percent = match numerator {
        Some(numerator) => numerator / pre_rate / elapsed_seconds,
        None => return RateOutcome::clamped(negative, params),
    };

    if percent > U256::from(params.max_rate_percent) {
        return RateOutcome::clamped(negative, params);
    }

    let magnitude = percent.saturating_to::<u64>() as f64;
    RateOutcome {
        rate: if negative { -magnitude } else { magnitude },
        class: RateClass::Normal,
    }
}

/// `part * 10000 / whole`, or zero when `whole` is zero
pub fn basis_points(part: U256, whole: U256) -> U256 {
    if whole.is_zero() {
        return U256::ZERO;
    }
    part.saturating_mul(U256::from(BASIS_POINTS)) / whole
}

/// Token balance of a (possibly negative) share position: `shares * pooled / total_shares`
pub fn token_balance(shares: I256, pooled_value: U256, total_shares: U256) -> I256 {
    if total_shares.is_zero() || shares.is_zero() {
        return I256::ZERO;
    }
    let sign = if shares.is_negative() {
        Sign::Negative
    } else {
        Sign::Positive
    };
    let magnitude = shares.unsigned_abs().saturating_mul(pooled_value) / total_shares;
    I256::checked_from_sign_and_abs(sign, magnitude).unwrap_or(match sign {
        Sign::Negative => I256::MIN,
        Sign::Positive => I256::MAX,
    })
}

/// Unsigned amount as a signed delta, saturating at `I256::MAX`
pub fn signed(amount: U256) -> I256 {
    I256::try_from(amount).unwrap_or(I256::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_share_rate_scale_constant() {
        assert_eq!(SHARE_RATE_SCALE, U256::from(10u64).pow(U256::from(27u64)));
    }

    #[test]
    fn test_five_percent_year() {
        let outcome = annualized_rate_detailed(
            u(1_000_000),
            u(1_050_000),
            u(1_000_000),
            u(1_000_000),
            u(SECONDS_PER_YEAR),
            &RateParams::default(),
        );
        assert_eq!(outcome.class, RateClass::Normal);
        assert_eq!(outcome.rate, 5.0);
    }

    #[test]
    fn test_no_growth_is_zero() {
        let rate = annualized_rate(u(500), u(500), u(400), u(400), u(86_400));
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn test_negative_rate() {
        let rate = annualized_rate(
            u(1_000_000),
            u(990_000),
            u(1_000_000),
            u(1_000_000),
            u(SECONDS_PER_YEAR),
        );
        assert_eq!(rate, -1.0);
    }

    #[test]
    fn test_proportional_growth_ignores_share_rate_rounding() {
        let shares = u(300_000_000_000_000_000);
        let year = u(SECONDS_PER_YEAR);
        let small = annualized_rate(u(2), u(4), shares, shares, year);
        let large = annualized_rate(u(20), u(40), shares, shares, year);
        assert_eq!(small, 100.0);
        assert_eq!(small, large);
    }

    #[test]
    fn test_degenerate_inputs() {
        let params = RateParams::default();
        let zero_shares = annualized_rate_detailed(u(1), u(2), U256::ZERO, u(1), u(1), &params);
        assert_eq!(zero_shares.class, RateClass::ZeroShares);
        assert_eq!(zero_shares.rate, 0.0);

        let zero_time = annualized_rate_detailed(u(1), u(2), u(1), u(1), U256::ZERO, &params);
        assert_eq!(zero_time.class, RateClass::ZeroElapsed);

        let zero_value = annualized_rate_detailed(U256::ZERO, u(2), u(1), u(1), u(1), &params);
        assert_eq!(zero_value.class, RateClass::ZeroPreValue);

        // 1 wei against 10^27 shares gives a share rate of 1
        let tiny = annualized_rate_detailed(
            u(1),
            u(2),
            SHARE_RATE_SCALE,
            SHARE_RATE_SCALE,
            u(1),
            &params,
        );
        assert_eq!(tiny.class, RateClass::BelowThreshold);
        assert!(tiny.class.is_degenerate());
    }

    #[test]
    fn test_overflow_is_clamped() {
        let params = RateParams::default();
        // Doubling in one second
        let up = annualized_rate_detailed(u(1_000), u(2_000), u(1_000), u(1_000), u(1), &params);
        assert_eq!(up.class, RateClass::PositiveOverflow);
        assert_eq!(up.rate, MAX_RATE_PERCENT as f64);

        let down = annualized_rate_detailed(u(2_000), u(1), u(1_000), u(1_000), u(1), &params);
        assert_eq!(down.class, RateClass::NegativeOverflow);
        assert_eq!(down.rate, -(MAX_RATE_PERCENT as f64));
        assert!(down.class.is_overflow());
    }

    #[test]
    fn test_basis_points() {
        assert_eq!(basis_points(u(1), u(10)), u(1_000));
        assert_eq!(basis_points(u(5), U256::ZERO), U256::ZERO);
        assert_eq!(basis_points(u(1), u(3)), u(3_333));
    }

    #[test]
    fn test_token_balance_sign_preserved() {
        let pooled = u(1_100);
        let total = u(1_000);
        assert_eq!(token_balance(signed(u(100)), pooled, total), signed(u(110)));
        assert_eq!(
            token_balance(-signed(u(100)), pooled, total),
            -signed(u(110))
        );
        assert_eq!(token_balance(signed(u(100)), pooled, U256::ZERO), I256::ZERO);
    }
}
