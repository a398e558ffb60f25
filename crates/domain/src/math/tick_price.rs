//! Tick-to-price conversion on the 1.0001 geometric grid.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Price of token1 denominated in token0 at a tick, adjusted for the two
/// tokens' decimal precision.
///
/// `P = 1.0001^tick * 10^(decimals0 - decimals1)`
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> Result<Decimal, &'static str> {
    let ratio = 1.0001f64.powi(tick);
    let scale = 10f64.powi(i32::from(decimals0) - i32::from(decimals1));
    let price = ratio * scale;
    if !price.is_finite() {
        return Err("price out of range");
    }
    Decimal::from_f64(price).ok_or("overflow converting price")
}

/// Inverts a price. `None` when the denominator is exactly zero.
pub fn invert(price: Decimal) -> Option<Decimal> {
    if price.is_zero() {
        None
    } else {
        Some(Decimal::ONE / price)
    }
}

/// Spot price in both quote directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePair {
    /// token1 per token0.
    pub token1_per_token0: Decimal,
    /// token0 per token1; `None` only when the forward price is zero.
    pub token0_per_token1: Option<Decimal>,
}

pub fn price_pair(tick: i32, decimals0: u8, decimals1: u8) -> Result<PricePair, &'static str> {
    let forward = tick_to_price(tick, decimals0, decimals1)?;
    Ok(PricePair {
        token1_per_token0: forward,
        token0_per_token1: invert(forward),
    })
}

/// Price bounds of a tick range, in both quote directions.
///
/// Min and max are taken elementwise after inverting because tick ordering
/// does not survive inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub min_token1_per_token0: Decimal,
    pub max_token1_per_token0: Decimal,
    pub min_token0_per_token1: Option<Decimal>,
    pub max_token0_per_token1: Option<Decimal>,
}

pub fn range_bounds(
    tick_lower: i32,
    tick_upper: i32,
    decimals0: u8,
    decimals1: u8,
) -> Result<RangeBounds, &'static str> {
    let at_lower = tick_to_price(tick_lower, decimals0, decimals1)?;
    let at_upper = tick_to_price(tick_upper, decimals0, decimals1)?;
    let min = at_lower.min(at_upper);
    let max = at_lower.max(at_upper);
    Ok(RangeBounds {
        min_token1_per_token0: min,
        max_token1_per_token0: max,
        // inverting swaps which bound is the minimum
        min_token0_per_token1: invert(max),
        max_token0_per_token1: invert(min),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn close(a: Decimal, b: Decimal, tolerance: Decimal) {
        assert!((a - b).abs() < tolerance, "{a} != {b}");
    }

    #[test]
    fn tick_zero_equal_decimals_is_one() {
        let price = tick_to_price(0, 18, 18).unwrap();
        assert_eq!(price, Decimal::ONE);
    }

    #[test]
    fn decimal_precision_scales_the_price() {
        // 18 vs 6 decimals shifts the raw ratio by 10^12
        let price = tick_to_price(0, 18, 6).unwrap();
        assert_eq!(price, dec!(1000000000000));
    }

    #[test]
    fn tick_one_hundred_matches_reference() {
        let price = tick_to_price(100, 18, 18).unwrap();
        close(price, dec!(1.01004966), dec!(0.0000001));
    }

    #[test]
    fn both_directions_multiply_to_one() {
        let pair = price_pair(3500, 18, 6).unwrap();
        let product = pair.token1_per_token0 * pair.token0_per_token1.unwrap();
        close(product, Decimal::ONE, dec!(0.0000000001));
    }

    #[test]
    fn range_bounds_are_ordered_in_both_directions() {
        let bounds = range_bounds(-100, 100, 18, 6).unwrap();
        assert!(bounds.min_token1_per_token0 < bounds.max_token1_per_token0);
        let min_inv = bounds.min_token0_per_token1.unwrap();
        let max_inv = bounds.max_token0_per_token1.unwrap();
        assert!(min_inv < max_inv);
        // the inverted minimum comes from the forward maximum
        close(
            min_inv * bounds.max_token1_per_token0,
            Decimal::ONE,
            dec!(0.0000000001),
        );
    }
}
