//! Decomposition of position liquidity into token amounts.

use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Token amounts implied by a position's liquidity at a snapshot price, in
/// human units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub amount0: Decimal,
    pub amount1: Decimal,
}

/// Converts a Q64.96 sqrt price to a plain float.
pub fn sqrt_price_x96_to_float(sqrt_price_x96: U256) -> Result<f64, &'static str> {
    // U256 exceeds u128, so go through the decimal string
    let value: f64 = sqrt_price_x96
        .to_string()
        .parse()
        .map_err(|_| "unparseable sqrt price")?;
    Ok(value / 2f64.powi(96))
}

/// Closed-form decomposition of liquidity into token amounts.
///
/// The boundary convention is lower-inclusive, upper-exclusive: at
/// `current_tick == tick_lower` the position is in range, and at
/// `current_tick == tick_upper` it is entirely token1.
///
/// This is the fallback for the exact on-chain helper; it reproduces the
/// standard tick-pool identity without the pool's rounding semantics.
pub fn position_token_amounts(
    liquidity: u128,
    tick_lower: i32,
    tick_upper: i32,
    current_tick: i32,
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
) -> Result<TokenAmounts, &'static str> {
    if tick_lower >= tick_upper {
        return Err("tick_lower must be below tick_upper");
    }
    let sqrt_lower = 1.0001f64.powi(tick_lower).sqrt();
    let sqrt_upper = 1.0001f64.powi(tick_upper).sqrt();
    let l = liquidity as f64;

    let (raw0, raw1) = if current_tick < tick_lower {
        // entirely token0
        (l * (1.0 / sqrt_lower - 1.0 / sqrt_upper), 0.0)
    } else if current_tick >= tick_upper {
        // entirely token1
        (0.0, l * (sqrt_upper - sqrt_lower))
    } else {
        let sqrt_current = sqrt_price_x96_to_float(sqrt_price_x96)?;
        if sqrt_current <= 0.0 {
            return Err("sqrt price must be positive");
        }
        (
            l * (1.0 / sqrt_current - 1.0 / sqrt_upper),
            l * (sqrt_current - sqrt_lower),
        )
    };

    Ok(TokenAmounts {
        amount0: scale_raw_float(raw0.max(0.0), decimals0)?,
        amount1: scale_raw_float(raw1.max(0.0), decimals1)?,
    })
}

/// Scales a raw smallest-unit amount into human units.
pub fn scale_raw_float(raw: f64, decimals: u8) -> Result<Decimal, &'static str> {
    let scaled = raw / 10f64.powi(i32::from(decimals));
    if !scaled.is_finite() {
        return Err("amount out of range");
    }
    Decimal::from_f64(scaled).ok_or("overflow converting amount")
}

/// Scales an exact raw integer amount into human units, losslessly.
pub fn scale_raw_amount(raw: u128, decimals: u8) -> Result<Decimal, &'static str> {
    let mantissa: i128 = raw.try_into().map_err(|_| "amount exceeds decimal range")?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .map_err(|_| "amount exceeds decimal range")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqrt_price_at_tick(tick: i32) -> U256 {
        let sqrt_price = 1.0001f64.powi(tick).sqrt() * 2f64.powi(96);
        U256::from(sqrt_price as u128)
    }

    #[test]
    fn in_range_position_holds_both_tokens() {
        let amounts =
            position_token_amounts(1_000_000, -100, 100, 0, sqrt_price_at_tick(0), 18, 6)
                .unwrap();
        assert!(amounts.amount0 > Decimal::ZERO);
        assert!(amounts.amount1 > Decimal::ZERO);
    }

    #[test]
    fn above_range_position_is_all_token1() {
        let amounts =
            position_token_amounts(1_000_000, -100, 100, 150, sqrt_price_at_tick(150), 18, 6)
                .unwrap();
        assert_eq!(amounts.amount0, Decimal::ZERO);
        assert!(amounts.amount1 > Decimal::ZERO);
    }

    #[test]
    fn below_range_position_is_all_token0() {
        let amounts =
            position_token_amounts(1_000_000, -100, 100, -150, sqrt_price_at_tick(-150), 18, 6)
                .unwrap();
        assert!(amounts.amount0 > Decimal::ZERO);
        assert_eq!(amounts.amount1, Decimal::ZERO);
    }

    #[test]
    fn lower_bound_is_inclusive() {
        // at current_tick == tick_lower the in-range branch applies and the
        // position is effectively all token0
        let amounts =
            position_token_amounts(1_000_000, -100, 100, -100, sqrt_price_at_tick(-100), 18, 18)
                .unwrap();
        assert!(amounts.amount0 > Decimal::ZERO);
        assert!(amounts.amount1 >= Decimal::ZERO);
        assert!(amounts.amount1 < amounts.amount0 / Decimal::from(1000));
    }

    #[test]
    fn upper_bound_is_exclusive() {
        let amounts =
            position_token_amounts(1_000_000, -100, 100, 100, sqrt_price_at_tick(100), 18, 18)
                .unwrap();
        assert_eq!(amounts.amount0, Decimal::ZERO);
        assert!(amounts.amount1 > Decimal::ZERO);
    }

    #[test]
    fn inverted_tick_range_is_rejected() {
        let err = position_token_amounts(1, 100, -100, 0, sqrt_price_at_tick(0), 18, 18)
            .unwrap_err();
        assert_eq!(err, "tick_lower must be below tick_upper");
    }

    #[test]
    fn decomposition_is_deterministic() {
        let run = || {
            position_token_amounts(55_555_555, -8000, 8000, 42, sqrt_price_at_tick(42), 18, 6)
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn exact_integer_scaling_is_lossless() {
        let amount = scale_raw_amount(1_234_567_890_000_000_000, 18).unwrap();
        assert_eq!(amount.to_string(), "1.234567890000000000");
    }

    #[test]
    fn oversized_decimals_are_rejected() {
        assert!(scale_raw_amount(1, 40).is_err());
    }
}
