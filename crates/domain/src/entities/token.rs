use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals assumed for a token whose on-chain decimals read failed.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Error returned when parsing a chain address from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 40 hex digits, got {0}")]
    BadLength(usize),
    #[error("address contains a non-hex character")]
    NonHex,
}

/// A 20-byte chain address, stored lowercase-normalized.
///
/// Lowercasing happens once at parse time so an address can be used
/// directly as a map key against indexer and oracle responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the zero address, which factory and gauge lookups return
    /// when nothing is registered.
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressParseError::MissingPrefix)?;
        if hex.len() != 40 {
            return Err(AddressParseError::BadLength(hex.len()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError::NonHex);
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ERC-20 style token reference.
///
/// The symbol stays `None` when the on-chain read failed; a symbol is never
/// fabricated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: Option<String>,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: Option<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol,
            decimals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_case() {
        let addr: Address = "0xAbCdEF0123456789abcdef0123456789ABCDEF01"
            .parse()
            .unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "abcdef0123456789abcdef0123456789abcdef0123"
            .parse::<Address>()
            .unwrap_err();
        assert_eq!(err, AddressParseError::MissingPrefix);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "0xabcdef".parse::<Address>().unwrap_err();
        assert_eq!(err, AddressParseError::BadLength(6));
    }

    #[test]
    fn rejects_non_hex() {
        let err = "0xzzcdef0123456789abcdef0123456789abcdef01"
            .parse::<Address>()
            .unwrap_err();
        assert_eq!(err, AddressParseError::NonHex);
    }

    #[test]
    fn zero_address_is_zero() {
        let zero: Address = "0x0000000000000000000000000000000000000000"
            .parse()
            .unwrap();
        assert!(zero.is_zero());
        let nonzero: Address = "0x0000000000000000000000000000000000000001"
            .parse()
            .unwrap();
        assert!(!nonzero.is_zero());
    }

    #[test]
    fn deserializing_validates() {
        let ok: Result<Address, _> =
            serde_json::from_str("\"0xABcdef0123456789abcdef0123456789abcdef01\"");
        assert!(ok.is_ok());
        let bad: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(bad.is_err());
    }
}
