use super::token::{Address, Token};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token id of a position on the position manager contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a pool by the triple the factory keys pools on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub tick_spacing: i32,
}

/// One concentrated-liquidity position token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub token0: Token,
    pub token1: Token,
    pub tick_spacing: i32,
    /// Lower tick bound, inclusive.
    pub tick_lower: i32,
    /// Upper tick bound, exclusive. Always above `tick_lower`.
    pub tick_upper: i32,
    pub liquidity: u128,
    pub is_staked: bool,
    /// Pool resolved from the factory; `None` when the lookup failed.
    pub pool: Option<Address>,
}

impl Position {
    /// A staked position with zero reported liquidity still counts as
    /// active: gauge withdrawal clears liquidity atomically with unstaking,
    /// so a live stake implies backing liquidity.
    pub fn is_active(&self) -> bool {
        self.liquidity > 0 || self.is_staked
    }

    pub fn pool_key(&self) -> PoolKey {
        PoolKey {
            token0: self.token0.address.clone(),
            token1: self.token1.address.clone(),
            tick_spacing: self.tick_spacing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(addr: &str) -> Token {
        Token::new(addr.parse().unwrap(), None, 18)
    }

    fn position(liquidity: u128, is_staked: bool) -> Position {
        Position {
            id: PositionId(7),
            token0: token("0x1111111111111111111111111111111111111111"),
            token1: token("0x2222222222222222222222222222222222222222"),
            tick_spacing: 100,
            tick_lower: -1000,
            tick_upper: 1000,
            liquidity,
            is_staked,
            pool: None,
        }
    }

    #[test]
    fn unstaked_position_with_liquidity_is_active() {
        assert!(position(1, false).is_active());
    }

    #[test]
    fn staked_position_with_zero_liquidity_is_active() {
        assert!(position(0, true).is_active());
    }

    #[test]
    fn empty_unstaked_position_is_inactive() {
        assert!(!position(0, false).is_active());
    }
}
