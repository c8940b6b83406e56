use serde::{Deserialize, Serialize};

/// Kind of account, as reported in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Basic,
    Vesting,
    Htlc,
    Staking,
}

/// An account in the accounts tree. Balances are in Luna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    pub balance: u64,
    #[serde(flatten)]
    pub kind: AccountKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AccountKind {
    Basic,
    Vesting {
        owner: String,
        vesting_start: u64,
        vesting_step_blocks: u64,
        vesting_step_amount: u64,
        vesting_total_amount: u64,
    },
    Htlc {
        sender: String,
        recipient: String,
        hash_root: String,
        hash_count: u8,
        timeout: u64,
        total_amount: u64,
    },
    Staking,
}

impl Account {
    pub fn account_type(&self) -> AccountType {
        match self.kind {
            AccountKind::Basic => AccountType::Basic,
            AccountKind::Vesting { .. } => AccountType::Vesting,
            AccountKind::Htlc { .. } => AccountType::Htlc,
            AccountKind::Staking => AccountType::Staking,
        }
    }
}

/// A key pair held by the node's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub address: String,
    pub public_key: String,
    #[serde(default)]
    pub private_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn basic_account() {
        let account: Account = serde_json::from_value(json!({
            "address": "NQ07 0000 0000 0000 0000 0000 0000 0000 0000",
            "balance": 1_000_000,
            "type": "basic",
        }))
        .expect("decodes");
        assert_eq!(account.balance, 1_000_000);
        assert_eq!(account.account_type(), AccountType::Basic);
    }

    #[test]
    fn vesting_account() {
        let account: Account = serde_json::from_value(json!({
            "address": "NQ09 VF5Y 1PKV MRM4 5LE1 55KV P6R2 GXYJ XYQF",
            "balance": 52500000000000u64,
            "type": "vesting",
            "owner": "NQ62 YLSA NUK5 L3J8 QHAC RFSC KHGV YPT8 Y6H2",
            "vestingStart": 1,
            "vestingStepBlocks": 259200,
            "vestingStepAmount": 2625000000000u64,
            "vestingTotalAmount": 52500000000000u64,
        }))
        .expect("decodes");
        match &account.kind {
            AccountKind::Vesting {
                vesting_step_blocks,
                owner,
                ..
            } => {
                assert_eq!(*vesting_step_blocks, 259200);
                assert!(owner.starts_with("NQ62"));
            }
            other => panic!("expected vesting, got {other:?}"),
        }
    }

    #[test]
    fn htlc_account() {
        let account: Account = serde_json::from_value(json!({
            "address": "NQ46 NTNU QX94 MVD0 BBT0 GXAR QUHK VGNF 39ET",
            "balance": 1000,
            "type": "htlc",
            "sender": "NQ36 P00L 1N6T S3QL KJY8 6FH4 5XN4 DXY0 L7C8",
            "recipient": "NQ36 P00L 1N6T S3QL KJY8 6FH4 5XN4 DXY0 L7C8",
            "hashRoot": "cd3ce8",
            "hashCount": 1,
            "timeout": 1_105_605,
            "totalAmount": 1000,
        }))
        .expect("decodes");
        assert_eq!(account.account_type(), AccountType::Htlc);
    }

    #[test]
    fn unknown_account_type_is_rejected() {
        let result = serde_json::from_value::<Account>(json!({
            "address": "NQ07",
            "balance": 0,
            "type": "bogus",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn wallet_account_without_private_key() {
        let wallet: WalletAccount = serde_json::from_value(json!({
            "address": "NQ07",
            "publicKey": "ab",
        }))
        .expect("decodes");
        assert!(wallet.private_key.is_none());
    }
}
