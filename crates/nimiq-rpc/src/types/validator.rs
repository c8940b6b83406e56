use serde::{Deserialize, Serialize};

/// A validator registered in the staking contract. Balances are in Luna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    pub address: String,
    pub signing_key: String,
    pub voting_key: String,
    pub reward_address: String,
    pub balance: u64,
    pub num_stakers: u32,
    #[serde(default)]
    pub retired: bool,
    /// Block from which the validator is inactive.
    #[serde(default)]
    pub inactivity_flag: Option<u32>,
    #[serde(default)]
    pub signal_data: Option<String>,
    #[serde(default)]
    pub jailed_from: Option<u32>,
}

impl Validator {
    pub fn is_active(&self) -> bool {
        self.inactivity_flag.is_none() && self.jailed_from.is_none() && !self.retired
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkedValidators {
    pub block_number: u32,
    pub validators: Vec<Validator>,
}

/// A staker and its delegation. Balances are in Luna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staker {
    pub address: String,
    pub balance: u64,
    #[serde(default)]
    pub inactive_balance: u64,
    #[serde(default)]
    pub retired_balance: u64,
    #[serde(default)]
    pub delegation: Option<String>,
    #[serde(default)]
    pub inactive_from: Option<u32>,
}
