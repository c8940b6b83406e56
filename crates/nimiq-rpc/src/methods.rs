//! Typed wrappers over the node's RPC methods.
//!
//! Optional arguments are always sent, as `null` when absent, so the node sees
//! a fixed positional layout per method.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::client::NimiqClient;
use crate::error::ClientError;
use crate::subscription::Subscription;
use crate::types::{
    Account, Block, BlockLog, Inherent, LogType, MempoolEntry, MempoolInfo, ParkedValidators,
    RpcResult, SlashedSlots, Slot, Staker, StateData, Transaction, ValidityStartHeight, Validator,
    WalletAccount,
};

fn data_of<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value::<RpcResult<T>>(value).map(|result| result.data)
}

fn state_of<T: DeserializeOwned>(value: Value) -> Result<StateData<T>, serde_json::Error> {
    serde_json::from_value(value)
}

impl NimiqClient {
    // ==========================================================================
    // Wallet
    // ==========================================================================

    /// Addresses of the accounts held by the node's wallet.
    pub async fn list_accounts(&self) -> Result<Vec<String>, ClientError> {
        self.call_list("listAccounts", vec![]).await
    }

    pub async fn create_account(
        &self,
        passphrase: Option<&str>,
    ) -> Result<WalletAccount, ClientError> {
        self.call_data("createAccount", vec![json!(passphrase)])
            .await
    }

    /// Import a hex-encoded private key. Returns the account's address.
    pub async fn import_raw_key(
        &self,
        private_key: &str,
        passphrase: Option<&str>,
    ) -> Result<String, ClientError> {
        self.call_data("importRawKey", vec![json!(private_key), json!(passphrase)])
            .await
    }

    pub async fn is_account_imported(&self, address: &str) -> Result<bool, ClientError> {
        self.call_data("isAccountImported", vec![json!(address)])
            .await
    }

    pub async fn is_account_unlocked(&self, address: &str) -> Result<bool, ClientError> {
        self.call_data("isAccountUnlocked", vec![json!(address)])
            .await
    }

    pub async fn lock_account(&self, address: &str) -> Result<(), ClientError> {
        self.call_raw("lockAccount", vec![json!(address)]).await?;
        Ok(())
    }

    /// Unlock a wallet account, for `duration` blocks if given.
    pub async fn unlock_account(
        &self,
        address: &str,
        passphrase: Option<&str>,
        duration: Option<u64>,
    ) -> Result<(), ClientError> {
        self.call_raw(
            "unlockAccount",
            vec![json!(address), json!(passphrase), json!(duration)],
        )
        .await?;
        Ok(())
    }

    // ==========================================================================
    // Chain State
    // ==========================================================================

    pub async fn batch_number(&self) -> Result<u32, ClientError> {
        self.call_data("getBatchNumber", vec![]).await
    }

    pub async fn block_number(&self) -> Result<u32, ClientError> {
        self.call_data("getBlockNumber", vec![]).await
    }

    pub async fn epoch_number(&self) -> Result<u32, ClientError> {
        self.call_data("getEpochNumber", vec![]).await
    }

    pub async fn is_consensus_established(&self) -> Result<bool, ClientError> {
        self.call_data("isConsensusEstablished", vec![]).await
    }

    /// An unknown address yields an empty basic account.
    pub async fn get_account_by_address(
        &self,
        address: &str,
    ) -> Result<StateData<Account>, ClientError> {
        self.call_state("getAccountByAddress", vec![json!(address)])
            .await
    }

    /// Every account in the accounts tree.
    pub async fn get_accounts(&self) -> Result<StateData<Vec<Account>>, ClientError> {
        self.call_state("getAccounts", vec![]).await
    }

    // ==========================================================================
    // Validators & Staking
    // ==========================================================================

    pub async fn get_active_validators(&self) -> Result<StateData<Vec<Validator>>, ClientError> {
        self.call_state("getActiveValidators", vec![]).await
    }

    pub async fn get_validators(&self) -> Result<StateData<Vec<Validator>>, ClientError> {
        self.call_state("getValidators", vec![]).await
    }

    pub async fn get_validator_by_address(
        &self,
        address: &str,
    ) -> Result<Option<StateData<Validator>>, ClientError> {
        self.call("getValidatorByAddress", vec![json!(address)])
            .await
    }

    pub async fn get_parked_validators(&self) -> Result<StateData<ParkedValidators>, ClientError> {
        self.call_state("getParkedValidators", vec![]).await
    }

    pub async fn get_current_slashed_slots(&self) -> Result<StateData<SlashedSlots>, ClientError> {
        self.call_state("getCurrentSlashedSlots", vec![]).await
    }

    pub async fn get_previous_slashed_slots(
        &self,
    ) -> Result<StateData<SlashedSlots>, ClientError> {
        self.call_state("getPreviousSlashedSlots", vec![]).await
    }

    /// The slot that produced block `block_number`, shifted by `offset` views
    /// if given.
    pub async fn get_slot_at(
        &self,
        block_number: u32,
        offset: Option<u32>,
    ) -> Result<StateData<Slot>, ClientError> {
        self.call_state("getSlotAt", vec![json!(block_number), json!(offset)])
            .await
    }

    pub async fn get_staker_by_address(
        &self,
        address: &str,
    ) -> Result<StateData<Staker>, ClientError> {
        self.call_state("getStakerByAddress", vec![json!(address)])
            .await
    }

    pub async fn get_stakers_by_validator_address(
        &self,
        address: &str,
    ) -> Result<StateData<Vec<Staker>>, ClientError> {
        self.call_state("getStakersByValidatorAddress", vec![json!(address)])
            .await
    }

    /// Address of the validator run by this node.
    pub async fn get_validator_address(&self) -> Result<String, ClientError> {
        self.call_data("getAddress", vec![]).await
    }

    pub async fn get_validator_signing_key(&self) -> Result<String, ClientError> {
        self.call_data("getSigningKey", vec![]).await
    }

    pub async fn get_validator_voting_key(&self) -> Result<String, ClientError> {
        self.call_data("getVotingKey", vec![]).await
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    pub async fn get_block_by_hash(
        &self,
        hash: &str,
        include_transactions: Option<bool>,
    ) -> Result<Option<Block>, ClientError> {
        self.call_optional(
            "getBlockByHash",
            vec![json!(hash), json!(include_transactions)],
        )
        .await
    }

    pub async fn get_block_by_number(
        &self,
        height: u32,
        include_transactions: Option<bool>,
    ) -> Result<Option<Block>, ClientError> {
        self.call_optional(
            "getBlockByNumber",
            vec![json!(height), json!(include_transactions)],
        )
        .await
    }

    pub async fn get_latest_block(&self, include_body: Option<bool>) -> Result<Block, ClientError> {
        self.call_data("getLatestBlock", vec![json!(include_body)])
            .await
    }

    pub async fn get_block_transaction_count_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<u32>, ClientError> {
        self.call_optional("getBlockTransactionCountByHash", vec![json!(hash)])
            .await
    }

    pub async fn get_block_transaction_count_by_number(
        &self,
        height: u32,
    ) -> Result<Option<u32>, ClientError> {
        self.call_optional("getBlockTransactionCountByNumber", vec![json!(height)])
            .await
    }

    pub async fn get_inherents_by_batch_number(
        &self,
        batch_number: u32,
    ) -> Result<Vec<Inherent>, ClientError> {
        self.call_list("getInherentsByBatchNumber", vec![json!(batch_number)])
            .await
    }

    pub async fn get_inherents_by_block_number(
        &self,
        height: u32,
    ) -> Result<Vec<Inherent>, ClientError> {
        self.call_list("getInherentsByBlockNumber", vec![json!(height)])
            .await
    }

    // ==========================================================================
    // Transactions
    // ==========================================================================

    pub async fn get_transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<Transaction>, ClientError> {
        self.call_optional("getTransactionByHash", vec![json!(hash)])
            .await
    }

    /// Transactions touching `address`, newest first, at most `max` of them.
    pub async fn get_transactions_by_address(
        &self,
        address: &str,
        max: Option<u16>,
    ) -> Result<Vec<Transaction>, ClientError> {
        self.call_list("getTransactionsByAddress", vec![json!(address), json!(max)])
            .await
    }

    pub async fn get_transaction_hashes_by_address(
        &self,
        address: &str,
        max: Option<u16>,
    ) -> Result<Vec<String>, ClientError> {
        self.call_list(
            "getTransactionHashesByAddress",
            vec![json!(address), json!(max)],
        )
        .await
    }

    pub async fn get_transactions_by_batch_number(
        &self,
        batch_number: u32,
    ) -> Result<Vec<Transaction>, ClientError> {
        self.call_list("getTransactionsByBatchNumber", vec![json!(batch_number)])
            .await
    }

    pub async fn get_transactions_by_block_number(
        &self,
        height: u32,
    ) -> Result<Vec<Transaction>, ClientError> {
        self.call_list("getTransactionsByBlockNumber", vec![json!(height)])
            .await
    }

    /// Decode a hex-encoded serialized transaction without sending it.
    pub async fn get_raw_transaction_info(&self, raw: &str) -> Result<Transaction, ClientError> {
        self.call_data("getRawTransactionInfo", vec![json!(raw)])
            .await
    }

    /// Broadcast a hex-encoded signed transaction. Returns its hash.
    pub async fn send_raw_transaction(&self, raw: &str) -> Result<String, ClientError> {
        self.call_data("sendRawTransaction", vec![json!(raw)]).await
    }

    /// Create, sign and send a basic transfer from an unlocked wallet account.
    pub async fn send_basic_transaction(
        &self,
        wallet: &str,
        recipient: &str,
        value: u64,
        fee: u64,
        validity_start_height: ValidityStartHeight,
    ) -> Result<String, ClientError> {
        self.call_data(
            "sendBasicTransaction",
            vec![
                json!(wallet),
                json!(recipient),
                json!(value),
                json!(fee),
                json!(validity_start_height),
            ],
        )
        .await
    }

    /// Add stake to an existing staker from an unlocked wallet account.
    pub async fn send_stake_transaction(
        &self,
        wallet: &str,
        staker: &str,
        value: u64,
        fee: u64,
        validity_start_height: ValidityStartHeight,
    ) -> Result<String, ClientError> {
        self.call_data(
            "sendStakeTransaction",
            vec![
                json!(wallet),
                json!(staker),
                json!(value),
                json!(fee),
                json!(validity_start_height),
            ],
        )
        .await
    }

    // ==========================================================================
    // Mempool
    // ==========================================================================

    pub async fn mempool(&self) -> Result<MempoolInfo, ClientError> {
        self.call_data("mempool", vec![]).await
    }

    pub async fn mempool_content(
        &self,
        include_transactions: Option<bool>,
    ) -> Result<Vec<MempoolEntry>, ClientError> {
        self.call_list("mempoolContent", vec![json!(include_transactions)])
            .await
    }

    /// Minimum fee per byte the mempool accepts, in Luna.
    pub async fn min_fee_per_byte(&self) -> Result<f64, ClientError> {
        self.call_data("getMinFeePerByte", vec![]).await
    }

    // ==========================================================================
    // Network
    // ==========================================================================

    pub async fn peer_count(&self) -> Result<u32, ClientError> {
        self.call_data("getPeerCount", vec![]).await
    }

    pub async fn peer_id(&self) -> Result<String, ClientError> {
        self.call_data("getPeerId", vec![]).await
    }

    pub async fn peer_list(&self) -> Result<Vec<String>, ClientError> {
        self.call_list("getPeerList", vec![]).await
    }

    // ==========================================================================
    // Subscriptions
    // ==========================================================================

    /// Every new head block. Requires a websocket connection.
    pub async fn subscribe_for_head_block(
        &self,
        include_transactions: Option<bool>,
    ) -> Result<Subscription<Block>, ClientError> {
        self.subscribe(
            "subscribeForHeadBlock",
            vec![json!(include_transactions)],
            data_of::<Block>,
        )
        .await
    }

    /// The hash of every new head block. Requires a websocket connection.
    pub async fn subscribe_for_head_block_hash(&self) -> Result<Subscription<String>, ClientError> {
        self.subscribe("subscribeForHeadBlockHash", vec![], data_of::<String>)
            .await
    }

    /// Block logs touching `addresses`, restricted to `log_types` (all types
    /// when empty). Requires a websocket connection.
    pub async fn subscribe_for_logs_by_addresses_and_types(
        &self,
        addresses: &[String],
        log_types: &[LogType],
    ) -> Result<Subscription<StateData<BlockLog>>, ClientError> {
        self.subscribe(
            "subscribeForLogsByAddressesAndTypes",
            vec![json!(addresses), json!(log_types)],
            state_of::<BlockLog>,
        )
        .await
    }

    /// Election results for one validator. Requires a websocket connection.
    pub async fn subscribe_for_validator_election_by_address(
        &self,
        address: &str,
    ) -> Result<Subscription<StateData<Validator>>, ClientError> {
        self.subscribe(
            "subscribeForValidatorElectionByAddress",
            vec![json!(address)],
            state_of::<Validator>,
        )
        .await
    }
}
