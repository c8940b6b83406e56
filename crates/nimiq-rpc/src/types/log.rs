//! Execution logs emitted when blocks are applied or reverted.

use serde::{Deserialize, Serialize};

/// Kind of a [`Log`], as used to filter log subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogType {
    PayFee,
    Transfer,
    HtlcCreate,
    HtlcTimeoutResolve,
    HtlcRegularTransfer,
    HtlcEarlyResolve,
    VestingCreate,
    CreateValidator,
    UpdateValidator,
    InactivateValidator,
    ReactivateValidator,
    UnparkValidator,
    CreateStaker,
    Stake,
    UpdateStaker,
    DeleteValidator,
    Unstake,
    PayoutReward,
    Park,
    Slash,
    RevertContract,
}

/// One state change caused by a transaction or inherent. Amounts are in Luna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Log {
    PayFee {
        from: String,
        fee: u64,
    },
    Transfer {
        from: String,
        to: String,
        amount: u64,
    },
    HtlcCreate {
        contract_address: String,
        sender: String,
        recipient: String,
        hash_algorithm: String,
        hash_root: String,
        hash_count: u8,
        timeout: u64,
        total_amount: u64,
    },
    HtlcTimeoutResolve {
        contract_address: String,
    },
    HtlcRegularTransfer {
        contract_address: String,
        pre_image: String,
        hash_depth: u8,
    },
    HtlcEarlyResolve {
        contract_address: String,
    },
    VestingCreate {
        contract_owner: String,
        owner: String,
        start_time: u64,
        time_step: u64,
        step_amount: u64,
        total_amount: u64,
    },
    CreateValidator {
        validator_address: String,
        reward_address: String,
    },
    UpdateValidator {
        validator_address: String,
        old_reward_address: String,
        new_reward_address: Option<String>,
    },
    InactivateValidator {
        validator_address: String,
    },
    ReactivateValidator {
        validator_address: String,
    },
    UnparkValidator {
        validator_address: String,
    },
    CreateStaker {
        staker_address: String,
        validator_address: Option<String>,
        value: u64,
    },
    Stake {
        staker_address: String,
        #[serde(default)]
        validator_address: Option<String>,
        value: u64,
    },
    UpdateStaker {
        staker_address: String,
        #[serde(default)]
        old_validator_address: Option<String>,
        #[serde(default)]
        new_validator_address: Option<String>,
    },
    DeleteValidator {
        validator_address: String,
        reward_address: String,
    },
    Unstake {
        staker_address: String,
        #[serde(default)]
        validator_address: Option<String>,
        value: u64,
    },
    PayoutReward {
        to: String,
        value: u64,
    },
    Park {
        validator_address: String,
        event_block: u32,
    },
    Slash {
        validator_address: String,
        event_block: u32,
        slot: u16,
        newly_disabled: bool,
    },
    RevertContract {
        contract_address: String,
    },
}

impl Log {
    pub fn log_type(&self) -> LogType {
        match self {
            Self::PayFee { .. } => LogType::PayFee,
            Self::Transfer { .. } => LogType::Transfer,
            Self::HtlcCreate { .. } => LogType::HtlcCreate,
            Self::HtlcTimeoutResolve { .. } => LogType::HtlcTimeoutResolve,
            Self::HtlcRegularTransfer { .. } => LogType::HtlcRegularTransfer,
            Self::HtlcEarlyResolve { .. } => LogType::HtlcEarlyResolve,
            Self::VestingCreate { .. } => LogType::VestingCreate,
            Self::CreateValidator { .. } => LogType::CreateValidator,
            Self::UpdateValidator { .. } => LogType::UpdateValidator,
            Self::InactivateValidator { .. } => LogType::InactivateValidator,
            Self::ReactivateValidator { .. } => LogType::ReactivateValidator,
            Self::UnparkValidator { .. } => LogType::UnparkValidator,
            Self::CreateStaker { .. } => LogType::CreateStaker,
            Self::Stake { .. } => LogType::Stake,
            Self::UpdateStaker { .. } => LogType::UpdateStaker,
            Self::DeleteValidator { .. } => LogType::DeleteValidator,
            Self::Unstake { .. } => LogType::Unstake,
            Self::PayoutReward { .. } => LogType::PayoutReward,
            Self::Park { .. } => LogType::Park,
            Self::Slash { .. } => LogType::Slash,
            Self::RevertContract { .. } => LogType::RevertContract,
        }
    }
}

/// Logs produced by one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLog {
    pub hash: String,
    pub logs: Vec<Log>,
}

/// Logs of one block, tagged by whether it was applied or reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockLog {
    AppliedBlock {
        inherents: Vec<Log>,
        timestamp: u64,
        transactions: Vec<TransactionLog>,
    },
    RevertedBlock {
        inherents: Vec<Log>,
        transactions: Vec<TransactionLog>,
    },
}

impl BlockLog {
    pub fn inherents(&self) -> &[Log] {
        match self {
            Self::AppliedBlock { inherents, .. } | Self::RevertedBlock { inherents, .. } => {
                inherents
            }
        }
    }

    pub fn transactions(&self) -> &[TransactionLog] {
        match self {
            Self::AppliedBlock { transactions, .. }
            | Self::RevertedBlock { transactions, .. } => transactions,
        }
    }

    pub fn is_reverted(&self) -> bool {
        matches!(self, Self::RevertedBlock { .. })
    }
}
