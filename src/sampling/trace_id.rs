//! 128-bit trace identifier.

use std::fmt;
use std::str::FromStr;
use crate::error::DialError;

/// W3C-style 16-byte trace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    pub const INVALID: TraceId = TraceId([0; 16]);

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Lower 64 bits read big-endian as a signed integer.
    pub fn random_part(&self) -> i64 {
        let mut lower = [0u8; 8];
        lower.copy_from_slice(&self.0[8..]);
        i64::from_be_bytes(lower)
    }

    /// Parse 32 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, DialError> {
        if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DialError::Parse(format!("invalid trace id: {}", hex)));
        }
        u128::from_str_radix(hex, 16)
            .map(Self::from_u128)
            .map_err(|e| DialError::Parse(e.to_string()))
    }
}

impl FromStr for TraceId {
    type Err = DialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}
