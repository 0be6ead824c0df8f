use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::time::Instant;

use crate::client::RewardSource;
use crate::config::CollectorConfig;
use crate::record::RewardRecord;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::store::RewardStore;

/// Counters for a finished collection run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub first_block: u64,
    pub fetched: u64,
    pub skipped: u64,
    pub failed_saves: u64,
    pub elapsed: std::time::Duration,
}

/// Fetches block rewards over a range and persists them after every block
pub struct Collector<C, S> {
    source: C,
    store: S,
    config: CollectorConfig,
    policy: RetryPolicy,
    rewards: Vec<RewardRecord>,
}

impl<C: RewardSource, S: RewardStore> Collector<C, S> {
    /// Create a collector, picking up whatever the store already holds.
    ///
    /// An unreadable store is treated as empty.
    pub fn new(source: C, store: S, config: CollectorConfig, policy: RetryPolicy) -> Self {
        let rewards = match store.load() {
            Ok(rewards) => {
                if let Some(last) = rewards.last() {
                    info!(
                        "Loaded {} stored rewards, last block {}",
                        rewards.len(),
                        last.block_number
                    );
                }
                rewards
            }
            Err(e) => {
                warn!("Failed to read rewards: {:#}", e);
                Vec::new()
            }
        };

        Self {
            source,
            store,
            config,
            policy,
            rewards,
        }
    }

    /// First block the run will fetch
    pub fn resume_block(&self) -> u64 {
        match self.rewards.last() {
            Some(last) => last.block_number + 1,
            None => self.config.start_block,
        }
    }

    pub fn records(&self) -> &[RewardRecord] {
        &self.rewards
    }

    /// Walk the block range once. Failed blocks are skipped, never retried later.
    pub async fn run(&mut self) -> RunSummary {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let first_block = self.resume_block();

        info!(
            "Collecting rewards for blocks {} to {}",
            first_block, self.config.end_block
        );

        let mut summary = RunSummary {
            started_at,
            first_block,
            fetched: 0,
            skipped: 0,
            failed_saves: 0,
            elapsed: Default::default(),
        };

        for block_number in first_block..=self.config.end_block {
            let label = format!("Block {}", block_number);
            let source = &self.source;
            let result = retry_with_backoff(&self.policy, &label, |_| {
                source.fetch_reward(block_number)
            })
            .await;

            let Some(block) = result.value else {
                error!("Failed to fetch valid reward for block {}", block_number);
                summary.skipped += 1;
                continue;
            };

            let record = RewardRecord::new(block_number, block);
            self.rewards.push(record);
            summary.fetched += 1;

            if let Err(e) = self.store.save(&self.rewards) {
                error!("Error writing rewards to file: {:#}", e);
                summary.failed_saves += 1;
            }

            info!(
                "Block {}\tTxCount: {}\tReward: {} ETH",
                block_number,
                record.tx_count,
                record.reward_eth()
            );
        }

        summary.elapsed = start_time.elapsed();
        info!(
            "Run started {} finished in {:.1}s: {} fetched, {} skipped, {} failed saves",
            summary.started_at.format("%Y-%m-%d %H:%M:%S"),
            summary.elapsed.as_secs_f64(),
            summary.fetched,
            summary.skipped,
            summary.failed_saves
        );

        summary
    }
}
