pub mod pool;
pub mod position;
pub mod token;

pub use pool::PoolSnapshot;
pub use position::{PoolKey, Position, PositionId};
pub use token::{Address, Token};
