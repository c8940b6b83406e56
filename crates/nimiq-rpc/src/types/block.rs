use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Micro,
    Macro,
}

/// A block. Fields shared by micro and macro blocks live here; the rest is
/// in [`BlockKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub hash: String,
    pub number: u32,
    pub batch: u32,
    pub epoch: u32,
    pub parent_hash: String,
    pub body_hash: String,
    pub state_hash: String,
    pub history_hash: String,
    pub extra_data: String,
    pub seed: String,
    pub size: u32,
    pub version: u16,
    /// Numeric id or network name, depending on the node release.
    pub network: Value,
    pub timestamp: u64,
    /// Present when the block was requested with its body.
    #[serde(default)]
    pub transactions: Option<BlockTransactions>,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum BlockKind {
    Micro {
        #[serde(default)]
        producer: Option<Value>,
        #[serde(default)]
        fork_proofs: Option<Vec<ForkProof>>,
        #[serde(default)]
        justification: Option<Value>,
        #[serde(default)]
        equivocation_proofs: Option<Vec<Value>>,
    },
    Macro {
        is_election_block: bool,
        parent_election_hash: String,
        #[serde(default)]
        interlink: Option<Vec<String>>,
        #[serde(default)]
        slots: Option<Vec<Value>>,
        #[serde(default)]
        lost_reward_set: Option<Vec<u16>>,
        #[serde(default)]
        disabled_set: Option<Vec<u16>>,
        #[serde(default)]
        justification: Option<Value>,
    },
}

/// Block body: transaction hashes, or full transactions when requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<String>),
    Full(Vec<Transaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            Self::Hashes(hashes) => hashes.len(),
            Self::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self.kind {
            BlockKind::Micro { .. } => BlockType::Micro,
            BlockKind::Macro { .. } => BlockType::Macro,
        }
    }

    pub fn is_election_block(&self) -> bool {
        matches!(
            self.kind,
            BlockKind::Macro {
                is_election_block: true,
                ..
            }
        )
    }
}

// ==============================================================================
// Slots
// ==============================================================================

/// The validator slot that produced, or will produce, a given block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_number: u16,
    pub validator: String,
    pub public_key: String,
}

/// Slots punished during a batch. Both sets are bitsets as sent by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashedSlots {
    pub block_number: u32,
    pub lost_rewards: Value,
    pub disabled: Value,
}

/// Proof that a producer signed two blocks at the same height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkProof {
    pub block_number: u32,
    #[serde(default)]
    pub view_number: Option<u32>,
    pub hashes: Vec<String>,
}
