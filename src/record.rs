use serde::{Deserialize, Serialize};

/// Number of wei in one ETH.
pub const WEI_PER_ETH: f64 = 1e18;

/// Convert a wei amount into ETH for display
pub fn wei_to_eth(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETH
}

/// Reward data for a single block as reported by the explorer API
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockReward {
    pub producer_reward: u128,
    pub tx_count: u64,
}

/// One persisted entry of the rewards file
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    /// Producer reward in wei
    pub reward: u128,
    #[serde(rename = "txCount")]
    pub tx_count: u64,
}

impl RewardRecord {
    pub fn new(block_number: u64, block: BlockReward) -> Self {
        Self {
            block_number,
            reward: block.producer_reward,
            tx_count: block.tx_count,
        }
    }

    pub fn reward_eth(&self) -> f64 {
        wei_to_eth(self.reward)
    }

    /// A block with no transactions
    pub fn is_empty_block(&self) -> bool {
        self.tx_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_persisted_field_names() {
        let record = RewardRecord {
            block_number: 17000000,
            reward: 45_000_000_000_000_000,
            tx_count: 112,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["blockNumber"], 17000000);
        assert_eq!(json["txCount"], 112);
        assert_eq!(json["reward"], 45_000_000_000_000_000u64);
    }

    #[test]
    fn rewards_above_i64_survive_decoding() {
        // 12 ETH does not fit in an i64 number of wei
        let json = r#"[{"blockNumber":1,"reward":12000000000000000000,"txCount":3}]"#;
        let records: Vec<RewardRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].reward, 12_000_000_000_000_000_000);
        assert_eq!(records[0].reward_eth(), 12.0);
    }

    #[test]
    fn empty_block_is_zero_transactions() {
        let block = BlockReward {
            producer_reward: 0,
            tx_count: 0,
        };
        assert!(RewardRecord::new(5, block).is_empty_block());
        assert_eq!(wei_to_eth(500_000_000_000_000_000), 0.5);
    }
}
