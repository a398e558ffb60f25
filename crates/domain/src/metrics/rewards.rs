//! Gauge emission attribution and staking APR.
//!
//! Attribution is proportional to staked liquidity, which assumes staked
//! liquidity is fungible within a gauge. That is a property of the pool
//! design, taken as given here rather than re-derived.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_WEEK: u64 = 604_800;
/// Exactly 365 days; applied to every annualization in the crate.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Share of a gauge's emissions attributable to one staked position.
///
/// Zero when either side is zero, and clamped at one so a torn pair of
/// reads can never attribute more than the whole emission stream.
pub fn liquidity_share(my_liquidity: u128, total_staked_liquidity: u128) -> Decimal {
    if my_liquidity == 0 || total_staked_liquidity == 0 {
        return Decimal::ZERO;
    }
    match (
        Decimal::from_u128(my_liquidity),
        Decimal::from_u128(total_staked_liquidity),
    ) {
        (Some(mine), Some(total)) if !total.is_zero() => (mine / total).min(Decimal::ONE),
        // liquidity past Decimal's 96-bit mantissa: a float ratio is close
        // enough for a proportion
        _ => {
            let ratio = (my_liquidity as f64 / total_staked_liquidity as f64).min(1.0);
            Decimal::from_f64(ratio).unwrap_or(Decimal::ONE)
        }
    }
}

/// Emission flow attributed to a position, projected over standard periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardProjection {
    pub per_second: Decimal,
    pub per_day: Decimal,
    pub per_week: Decimal,
    pub per_year: Decimal,
}

/// Projects the gauge-wide emission rate onto one position's share.
pub fn project_rewards(pool_rate_per_second: Decimal, share: Decimal) -> RewardProjection {
    let per_second = pool_rate_per_second * share;
    RewardProjection {
        per_second,
        per_day: per_second * Decimal::from(SECONDS_PER_DAY),
        per_week: per_second * Decimal::from(SECONDS_PER_WEEK),
        per_year: per_second * Decimal::from(SECONDS_PER_YEAR),
    }
}

/// Annualized reward value as a percentage of position value.
///
/// `None` when the position value or the reward price is not positive; an
/// unknown APR is reported as absent, never as zero or infinity.
pub fn staking_apr(
    reward_per_year: Decimal,
    reward_price_usd: Decimal,
    position_value_usd: Decimal,
) -> Option<Decimal> {
    if position_value_usd <= Decimal::ZERO || reward_price_usd <= Decimal::ZERO {
        return None;
    }
    Some(reward_per_year * reward_price_usd / position_value_usd * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn share_matches_reference_scenario() {
        // gauge rate 1000/s, total staked 10_000, mine 2_500
        let share = liquidity_share(2_500, 10_000);
        assert_eq!(share, dec!(0.25));

        let projection = project_rewards(dec!(1000), share);
        assert_eq!(projection.per_second, dec!(250));
        assert_eq!(projection.per_day, dec!(21600000));
        assert_eq!(projection.per_week, dec!(151200000));
        assert_eq!(projection.per_year, dec!(7884000000));
    }

    #[test]
    fn share_is_zero_when_either_side_is_zero() {
        assert_eq!(liquidity_share(0, 10_000), Decimal::ZERO);
        assert_eq!(liquidity_share(10_000, 0), Decimal::ZERO);
    }

    #[test]
    fn share_never_exceeds_one() {
        assert_eq!(liquidity_share(20_000, 10_000), Decimal::ONE);
        assert_eq!(liquidity_share(u128::MAX, u128::MAX / 2), Decimal::ONE);
    }

    #[test]
    fn apr_is_absent_for_worthless_position() {
        assert_eq!(staking_apr(dec!(1000), dec!(2), Decimal::ZERO), None);
        assert_eq!(staking_apr(dec!(1000), Decimal::ZERO, dec!(50)), None);
    }

    #[test]
    fn apr_matches_hand_computation() {
        // 100 reward tokens a year at $2 against a $1000 position
        let apr = staking_apr(dec!(100), dec!(2), dec!(1000)).unwrap();
        assert_eq!(apr, dec!(20));
    }
}
