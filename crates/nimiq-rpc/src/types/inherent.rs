use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A protocol-generated state change (reward, penalty, jail) applied with a
/// block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inherent {
    /// Numeric code or name, depending on the node release.
    #[serde(rename = "type")]
    pub kind: Value,
    pub block_number: u32,
    pub timestamp: u64,
    pub target: String,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reward_inherent() {
        let inherent: Inherent = serde_json::from_value(json!({
            "type": "reward",
            "blockNumber": 43200,
            "timestamp": 1_700_000_000_000u64,
            "target": "NQ12 REW",
            "value": 875,
            "hash": "cc",
        }))
        .expect("decodes");
        assert_eq!(inherent.kind, json!("reward"));
        assert_eq!(inherent.value, 875);
        assert!(inherent.data.is_none());
    }
}
