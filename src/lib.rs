//! Collects per-block execution-layer producer rewards from the beaconcha.in
//! API and computes descriptive statistics over the collected data.
//!
//! - [`collector`]: resumable fetch-and-persist loop over a block range
//! - [`client`]: reward lookup against the explorer API
//! - [`retry`]: bounded retries with quadratic backoff
//! - [`store`]: persistence of the reward sequence
//! - [`stats`]: mean, median, deviation, range and zero-reward frequency
//! - [`config`]: command line and environment configuration

pub mod client;
pub mod collector;
pub mod config;
pub mod record;
pub mod retry;
pub mod stats;
pub mod store;

pub use client::{BeaconchainClient, RewardSource};
pub use collector::{Collector, RunSummary};
pub use config::{Args, CollectorConfig};
pub use record::{BlockReward, RewardRecord};
pub use retry::RetryPolicy;
pub use stats::Report;
pub use store::{JsonFileStore, RewardStore, WriteMode};
