//! Persistence for the collected reward sequence.
//!
//! The whole sequence is rewritten on every save. [`WriteMode::Atomic`] writes
//! to a temporary file next to the target and renames it into place, so a crash
//! mid-write leaves the previous file intact.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;

use crate::record::RewardRecord;

/// Storage backend for the reward sequence
pub trait RewardStore {
    /// Load the full persisted sequence
    fn load(&self) -> Result<Vec<RewardRecord>>;

    /// Replace the persisted sequence with `records`
    fn save(&mut self, records: &[RewardRecord]) -> Result<()>;
}

/// How [`JsonFileStore`] replaces the file on save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and rewrite the file in place
    Overwrite,
    /// Write a sibling temp file, then rename it over the target
    #[default]
    Atomic,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" | "rewrite" => Ok(WriteMode::Overwrite),
            "atomic" | "rename" => Ok(WriteMode::Atomic),
            _ => Err(format!(
                "Unknown write mode: {}. Use 'atomic' or 'overwrite'.",
                s
            )),
        }
    }
}

/// Reward sequence stored as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    mode: WriteMode,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_in_place(&self, records: &[RewardRecord]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }

    fn write_atomic(&self, records: &[RewardRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, records)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to rename temp file to {}", self.path.display()))?;
        Ok(())
    }
}

impl RewardStore for JsonFileStore {
    fn load(&self) -> Result<Vec<RewardRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let records = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to decode {}", self.path.display()))?;
        Ok(records)
    }

    fn save(&mut self, records: &[RewardRecord]) -> Result<()> {
        match self.mode {
            WriteMode::Overwrite => self.write_in_place(records),
            WriteMode::Atomic => self.write_atomic(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(block_number: u64, reward: u128, tx_count: u64) -> RewardRecord {
        RewardRecord {
            block_number,
            reward,
            tx_count,
        }
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("rewards.json"), WriteMode::Atomic);
        assert!(store.load().is_err());
    }

    #[test]
    fn load_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.json");
        fs::write(&path, b"{not json").unwrap();
        let store = JsonFileStore::new(&path, WriteMode::Overwrite);
        assert!(store.load().is_err());
    }

    #[test]
    fn save_replaces_previous_contents() {
        for mode in [WriteMode::Atomic, WriteMode::Overwrite] {
            let dir = tempfile::tempdir().unwrap();
            let mut store = JsonFileStore::new(dir.path().join("rewards.json"), mode);

            let first = vec![record(1, 10, 0), record(2, 20, 4), record(3, 30, 9)];
            store.save(&first).unwrap();
            store.save(&first[..1]).unwrap();

            assert_eq!(store.load().unwrap(), vec![record(1, 10, 0)], "{:?}", mode);
        }
    }

    #[test]
    fn atomic_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("rewards.json"), WriteMode::Atomic);
        store.save(&[record(7, 1, 1)]).unwrap();
        store.save(&[record(7, 1, 1), record(8, 2, 2)]).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn file_format_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.json");
        let mut store = JsonFileStore::new(&path, WriteMode::Atomic);
        store.save(&[record(17000000, 5, 0)]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"[{"blockNumber":17000000,"reward":5,"txCount":0}]"#);
    }

    #[test]
    fn write_mode_parses_aliases() {
        assert_eq!("atomic".parse::<WriteMode>(), Ok(WriteMode::Atomic));
        assert_eq!("Overwrite".parse::<WriteMode>(), Ok(WriteMode::Overwrite));
        assert!("append".parse::<WriteMode>().is_err());
    }
}
