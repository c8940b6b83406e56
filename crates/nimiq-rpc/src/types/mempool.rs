use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// Mempool size, bucketed by fee per byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolInfo {
    pub total: u32,
    #[serde(default)]
    pub buckets: Vec<u32>,
    /// Transaction count per fee bucket, keyed by the bucket's lower bound.
    #[serde(flatten)]
    pub fee_buckets: BTreeMap<String, u32>,
}

/// A mempool transaction: only its hash, or the full transaction when
/// requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MempoolEntry {
    Hash(String),
    Transaction(Box<Transaction>),
}

impl MempoolEntry {
    pub fn hash(&self) -> &str {
        match self {
            Self::Hash(hash) => hash,
            Self::Transaction(tx) => &tx.hash,
        }
    }
}
