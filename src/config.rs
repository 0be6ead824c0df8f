//! Command line and environment configuration.
//!
//! Every flag can also be set through the environment variable shown in
//! `--help`; `main` loads a `.env` file before parsing.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::record::RewardRecord;
use crate::retry::RetryPolicy;
use crate::store::{JsonFileStore, RewardStore, WriteMode};

/// Block range walked by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    pub start_block: u64,
    /// Inclusive
    pub end_block: u64,
}

/// Collect execution-layer producer rewards and summarize them
#[derive(Parser, Debug, Clone)]
#[command(name = "block-reward-collector", author, version, about)]
pub struct Args {
    /// Read the rewards file and print statistics instead of collecting
    #[arg(long)]
    pub results: bool,

    /// beaconcha.in API key, required for collection
    #[arg(long, env = "BEACONCHAIN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the explorer API
    #[arg(long, env = "BEACONCHAIN_API_URL", default_value = "https://beaconcha.in")]
    pub api_url: String,

    /// First block to collect when no rewards are stored yet
    #[arg(long, env = "START_BLOCK", default_value = "17000000")]
    pub start_block: u64,

    /// Last block to collect (inclusive)
    #[arg(long, env = "END_BLOCK", default_value = "17050000")]
    pub end_block: u64,

    /// Fetch attempts per block before it is skipped
    #[arg(long, env = "MAX_RETRIES", default_value = "10")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; attempt i waits i² units after failing
    #[arg(long, env = "BACKOFF_UNIT_MS", default_value = "1000")]
    pub backoff_unit_ms: u64,

    /// Per-request timeout in seconds (none by default)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// JSON file holding the collected rewards
    #[arg(long, env = "REWARDS_FILE", default_value = "rewards.json")]
    pub rewards_file: PathBuf,

    /// How the rewards file is rewritten: 'atomic' or 'overwrite'
    #[arg(long, env = "WRITE_MODE", default_value = "atomic")]
    pub write_mode: WriteMode,

    /// Also write the statistics report to this CSV file
    #[arg(long, env = "CSV_OUT")]
    pub csv_out: Option<PathBuf>,
}

impl Args {
    pub fn collector_config(&self) -> Result<CollectorConfig> {
        if self.start_block > self.end_block {
            return Err(anyhow!(
                "start block {} is after end block {}",
                self.start_block,
                self.end_block
            ));
        }

        Ok(CollectorConfig {
            start_block: self.start_block,
            end_block: self.end_block,
        })
    }

    /// API key, which only collection needs
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("BEACONCHAIN_API_KEY environment variable is missing"))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            backoff_unit: Duration::from_millis(self.backoff_unit_ms),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.rewards_file, self.write_mode)
    }

    /// Rewards for statistics mode, where a missing or corrupt file is fatal
    pub fn load_rewards(&self) -> Result<Vec<RewardRecord>> {
        self.store().load().context("Failed to read rewards")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("block-reward-collector").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let args = parse(&[
            "--api-key",
            "abc",
            "--start-block",
            "100",
            "--end-block",
            "200",
            "--max-retries",
            "3",
            "--backoff-unit-ms",
            "250",
            "--write-mode",
            "overwrite",
        ]);

        assert!(!args.results);
        assert_eq!(args.require_api_key().unwrap(), "abc");
        assert_eq!(
            args.collector_config().unwrap(),
            CollectorConfig {
                start_block: 100,
                end_block: 200
            }
        );
        assert_eq!(
            args.retry_policy(),
            RetryPolicy {
                max_attempts: 3,
                backoff_unit: Duration::from_millis(250)
            }
        );
        assert_eq!(args.write_mode, WriteMode::Overwrite);
    }

    #[test]
    fn results_flag_selects_statistics() {
        let args = parse(&["--results", "--csv-out", "stats.csv", "--rewards-file", "r.json"]);
        assert!(args.results);
        assert_eq!(args.csv_out, Some(PathBuf::from("stats.csv")));
        assert_eq!(args.store().path(), PathBuf::from("r.json").as_path());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let args = parse(&["--start-block", "10", "--end-block", "5"]);
        assert!(args.collector_config().is_err());
    }

    #[test]
    fn empty_api_key_is_missing() {
        let args = parse(&["--api-key", ""]);
        assert!(args.require_api_key().is_err());
    }

    #[test]
    fn missing_rewards_file_fails_statistics_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.json");
        let args = parse(&["--results", "--rewards-file", path.to_str().unwrap()]);

        let err = args.load_rewards().unwrap_err();
        assert_eq!(err.to_string(), "Failed to read rewards");
        assert!(format!("{:#}", err).contains("rewards.json"));
    }

    #[test]
    fn stored_rewards_load_for_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.json");
        std::fs::write(&path, r#"[{"blockNumber":9,"reward":0,"txCount":0}]"#).unwrap();
        let args = parse(&["--results", "--rewards-file", path.to_str().unwrap()]);

        let rewards = args.load_rewards().unwrap();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].block_number, 9);
    }

    #[test]
    fn unknown_write_mode_fails_to_parse() {
        let result = Args::try_parse_from(["block-reward-collector", "--write-mode", "append"]);
        assert!(result.is_err());
    }
}
