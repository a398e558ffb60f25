//! Historical yield metrics derived from indexer aggregates.

use rust_decimal::Decimal;

/// Fee-based pool APR annualized from a trailing 7-day fee sum:
/// `(avg daily fees * 365 / tvl) * 100`. `None` when TVL is not positive.
///
/// Distinct from the staking APR; both are reported side by side.
pub fn pool_fee_apr(fees_7d_usd: Decimal, tvl_usd: Decimal) -> Option<Decimal> {
    if tvl_usd <= Decimal::ZERO {
        return None;
    }
    let avg_daily = fees_7d_usd / Decimal::from(7);
    Some(avg_daily * Decimal::from(365) / tvl_usd * Decimal::ONE_HUNDRED)
}

/// Lifetime fee yield on deposited value. `None` when nothing was
/// deposited.
pub fn position_roi(collected_fees_usd: Decimal, deposited_usd: Decimal) -> Option<Decimal> {
    if deposited_usd <= Decimal::ZERO {
        return None;
    }
    Some(collected_fees_usd / deposited_usd * Decimal::ONE_HUNDRED)
}

/// Whole days elapsed since the position's creation transaction.
pub fn age_in_days(created_at: u64, now: u64) -> u64 {
    now.saturating_sub(created_at) / 86_400
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fee_apr_annualizes_the_daily_average() {
        // 7 USD of fees over 7 days against 365 USD of TVL: 100% APR
        let apr = pool_fee_apr(dec!(7), dec!(365)).unwrap();
        assert_eq!(apr, dec!(100));
    }

    #[test]
    fn fee_apr_is_absent_without_tvl() {
        assert_eq!(pool_fee_apr(dec!(7), Decimal::ZERO), None);
    }

    #[test]
    fn roi_guards_the_zero_deposit() {
        assert_eq!(position_roi(dec!(10), Decimal::ZERO), None);
        assert_eq!(position_roi(dec!(10), dec!(200)), Some(dec!(5)));
    }

    #[test]
    fn age_rounds_down_to_whole_days() {
        assert_eq!(age_in_days(1_000, 1_000 + 86_400 * 3 + 86_399), 3);
        // clock skew must not underflow
        assert_eq!(age_in_days(2_000, 1_000), 0);
    }
}
