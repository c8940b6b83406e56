use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ClientError;

/// A transaction as reported by the node. Amounts are in Luna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default)]
    pub transaction_index: Option<u32>,
    pub from: String,
    #[serde(default)]
    pub from_address: Option<String>,
    pub to: String,
    #[serde(default)]
    pub to_address: Option<String>,
    pub value: u64,
    pub fee: u64,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub flags: u8,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub in_mempool: Option<bool>,
}

impl Transaction {
    pub fn is_confirmed(&self) -> bool {
        self.block_number.is_some()
    }
}

// ==============================================================================
// Validity Start Height
// ==============================================================================

/// First block at which a new transaction is valid.
///
/// Sent as a string: `"1000"` for an absolute height, `"+10"` for an offset
/// from the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityStartHeight {
    Absolute(u32),
    Relative(u32),
}

impl Default for ValidityStartHeight {
    fn default() -> Self {
        Self::Relative(0)
    }
}

impl fmt::Display for ValidityStartHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(height) => write!(f, "{height}"),
            Self::Relative(offset) => write!(f, "+{offset}"),
        }
    }
}

impl FromStr for ValidityStartHeight {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |_| ClientError::Config(format!("invalid validity start height: {s:?}"));
        match s.strip_prefix('+') {
            Some(offset) => offset.parse().map(Self::Relative).map_err(invalid),
            None => s.parse().map(Self::Absolute).map_err(invalid),
        }
    }
}

impl Serialize for ValidityStartHeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValidityStartHeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
