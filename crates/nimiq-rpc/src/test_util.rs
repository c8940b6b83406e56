//! Shared test helpers for `nimiq-rpc` unit tests.
//!
//! JSON fixtures shaped like real node output, so model and client tests
//! share one source of truth for dummy data.

use serde_json::{json, Value};

// ==============================================================================
// Envelopes
// ==============================================================================

/// Wrap `data` the way the node wraps every result.
pub fn wrapped(data: Value) -> Value {
    json!({"data": data, "metadata": null})
}

/// Wrap `data` with blockchain-state metadata.
pub fn with_state(data: Value, block_number: u32) -> Value {
    json!({
        "data": data,
        "metadata": {"blockNumber": block_number, "blockHash": format!("{block_number:064x}")},
    })
}

// ==============================================================================
// Models
// ==============================================================================

pub fn transaction_json(hash: &str) -> Value {
    json!({
        "hash": hash,
        "blockHash": "b10c",
        "blockNumber": 1000,
        "timestamp": 1_700_000_000_000u64,
        "confirmations": 5,
        "transactionIndex": 0,
        "from": "NQ01 SEND",
        "fromAddress": "NQ01 SEND",
        "to": "NQ02 RECV",
        "toAddress": "NQ02 RECV",
        "value": 100_000,
        "fee": 138,
        "data": null,
        "flags": 0,
    })
}

fn block_header(number: u32) -> Value {
    json!({
        "hash": format!("{number:064x}"),
        "number": number,
        "batch": number / 60,
        "epoch": number / 43200,
        "parentHash": format!("{:064x}", number.saturating_sub(1)),
        "bodyHash": "b0d1",
        "stateHash": "57a7",
        "historyHash": "4157",
        "extraData": "",
        "seed": "5eed",
        "size": 412,
        "version": 1,
        "network": 5,
        "timestamp": 1_700_000_000_000u64 + u64::from(number) * 1000,
    })
}

pub fn micro_block_json(number: u32) -> Value {
    let mut block = block_header(number);
    block["type"] = json!("micro");
    block["producer"] = json!({"slotNumber": 12, "validator": "NQ12 VAL", "publicKey": "ab"});
    block["justification"] = json!({"micro": "5167"});
    block
}

pub fn macro_block_json(number: u32) -> Value {
    let mut block = block_header(number);
    block["type"] = json!("macro");
    block["isElectionBlock"] = json!(number % 43200 == 0);
    block["parentElectionHash"] = json!("e1ec");
    block["lostRewardSet"] = json!([]);
    block["disabledSet"] = json!([]);
    block
}

pub fn validator_json(address: &str) -> Value {
    json!({
        "address": address,
        "signingKey": "5167",
        "votingKey": "7073",
        "rewardAddress": "NQ03 REW",
        "balance": 1_000_000_000,
        "numStakers": 3,
        "retired": false,
    })
}
