//! Descriptive statistics over a persisted reward sequence.
//!
//! All results are in ETH. Inputs are raw wei values and are never reordered;
//! functions that need sorted data sort a copy.

use alloy_primitives::U256;
use anyhow::{Context, Result};
use log::info;
use std::fmt;
use std::path::Path;

use crate::record::{wei_to_eth, RewardRecord, WEI_PER_ETH};

/// Arithmetic mean in ETH.
///
/// The sum is accumulated exactly in 256 bits and divided in integer space
/// before converting to floating point.
pub fn mean(values: &[u128]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let sum = values
        .iter()
        .fold(U256::ZERO, |acc, &value| acc + U256::from(value));
    let count = U256::from(values.len() as u64);

    // The quotient never exceeds the largest value, so both parts fit in u128
    let quotient = u128::try_from(sum / count).ok()?;
    let remainder = u128::try_from(sum % count).ok()?;
    let mean_wei = quotient as f64 + remainder as f64 / values.len() as f64;

    Some(mean_wei / WEI_PER_ETH)
}

fn sorted(values: &[u128]) -> Vec<u128> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted
}

/// Median in ETH. Even-sized sets average the two middle values.
pub fn median(values: &[u128]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let sorted = sorted(values);
    let middle = sorted.len() / 2;
    let median_wei = if sorted.len() % 2 == 0 {
        (sorted[middle - 1] as f64 + sorted[middle] as f64) / 2.0
    } else {
        sorted[middle] as f64
    };

    Some(median_wei / WEI_PER_ETH)
}

/// Population standard deviation in ETH around `mean_eth`.
pub fn std_dev(values: &[u128], mean_eth: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let sum: f64 = values
        .iter()
        .map(|&value| (wei_to_eth(value) - mean_eth).powi(2))
        .sum();

    Some((sum / values.len() as f64).sqrt())
}

/// Smallest and largest value in ETH
pub fn range(values: &[u128]) -> Option<(f64, f64)> {
    let min = values.iter().min()?;
    let max = values.iter().max()?;
    Some((wei_to_eth(*min), wei_to_eth(*max)))
}

// Linear interpolation between closest ranks, on already sorted wei values
fn percentile(sorted: &[u128], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let low = sorted[lower] as f64;
    let high = sorted[upper] as f64;
    low + (high - low) * (rank - lower as f64)
}

/// First and third quartile in ETH
pub fn quartiles(values: &[u128]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let sorted = sorted(values);
    Some((
        percentile(&sorted, 0.25) / WEI_PER_ETH,
        percentile(&sorted, 0.75) / WEI_PER_ETH,
    ))
}

/// Rewards of the blocks that directly follow an empty block.
///
/// An empty block at the end of the sequence has no successor and is ignored.
pub fn following_empty(records: &[RewardRecord]) -> Vec<u128> {
    records
        .windows(2)
        .filter(|pair| pair[0].is_empty_block())
        .map(|pair| pair[1].reward)
        .collect()
}

/// Statistics for one set of rewards
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
}

impl Summary {
    /// `None` for an empty set
    pub fn compute(values: &[u128]) -> Option<Self> {
        let mean = mean(values)?;
        let (min, max) = range(values)?;
        let (q1, q3) = quartiles(values)?;

        Some(Self {
            count: values.len(),
            mean,
            median: median(values)?,
            std_dev: std_dev(values, mean)?,
            min,
            max,
            q1,
            q3,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Blocks: {}", self.count)?;
        writeln!(f, "Mean: {} ETH", self.mean)?;
        writeln!(f, "Median: {} ETH", self.median)?;
        writeln!(f, "Standard Deviation: {} ETH", self.std_dev)?;
        writeln!(f, "Quartiles: {} - {} ETH", self.q1, self.q3)?;
        write!(f, "Range: {} - {} ETH", self.min, self.max)
    }
}

/// How many blocks paid no producer reward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroRewards {
    pub count: usize,
    pub percentage: f64,
}

impl ZeroRewards {
    /// `None` for an empty dataset
    pub fn compute(records: &[RewardRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let count = records.iter().filter(|r| r.reward == 0).count();
        Some(Self {
            count,
            percentage: count as f64 / records.len() as f64 * 100.0,
        })
    }
}

/// Full statistics report over a reward sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_blocks: usize,
    pub zero_rewards: Option<ZeroRewards>,
    pub all_blocks: Option<Summary>,
    pub after_empty: Option<Summary>,
}

impl Report {
    pub fn compute(records: &[RewardRecord]) -> Self {
        let rewards: Vec<u128> = records.iter().map(|r| r.reward).collect();

        Self {
            total_blocks: records.len(),
            zero_rewards: ZeroRewards::compute(records),
            all_blocks: Summary::compute(&rewards),
            after_empty: Summary::compute(&following_empty(records)),
        }
    }

    fn sections(&self) -> [(&'static str, &'static str, Option<&Summary>); 2] {
        [
            ("all_blocks", "Statistics for all blocks:", self.all_blocks.as_ref()),
            (
                "after_empty_block",
                "Statistics for blocks following empty blocks:",
                self.after_empty.as_ref(),
            ),
        ]
    }

    /// Log the report line by line
    pub fn log(&self) {
        info!("Blocks in dataset: {}", self.total_blocks);
        match &self.zero_rewards {
            Some(zero) => {
                info!("Number of Zero Rewards: {}", zero.count);
                info!("Percentage of Blocks with Zero Rewards: {} %", zero.percentage);
            }
            None => info!("Zero rewards: no data"),
        }

        for (_, title, summary) in self.sections() {
            info!("{}", title);
            match summary {
                Some(summary) => {
                    for line in summary.to_string().lines() {
                        info!("  {}", line);
                    }
                }
                None => info!("  no data"),
            }
        }
    }

    /// Export one row per partition. Partitions without data get a zero
    /// count and empty statistic columns.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        wtr.write_record([
            "Partition",
            "Blocks",
            "Mean (ETH)",
            "Median (ETH)",
            "Std Dev (ETH)",
            "Min (ETH)",
            "Max (ETH)",
            "Q1 (ETH)",
            "Q3 (ETH)",
        ])?;

        for (name, _, summary) in self.sections() {
            let row = match summary {
                Some(s) => vec![
                    name.to_string(),
                    s.count.to_string(),
                    s.mean.to_string(),
                    s.median.to_string(),
                    s.std_dev.to_string(),
                    s.min.to_string(),
                    s.max.to_string(),
                    s.q1.to_string(),
                    s.q3.to_string(),
                ],
                None => {
                    let mut row = vec![name.to_string(), "0".to_string()];
                    row.resize(9, String::new());
                    row
                }
            };
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        info!("Statistics written to {}", path.display());
        Ok(())
    }
}
