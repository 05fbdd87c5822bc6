//! Destination for assembled snapshots.

use crate::config::PublishTargets;
use crate::error::Result;
use crate::records::Snapshot;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub trait SnapshotSink {
    /// Persists every table of `snapshot`, replacing only its own
    /// `(patch, set_mutator)` partition.
    fn write(&mut self, snapshot: &Snapshot, targets: PublishTargets) -> Result<()>;
}

/// Writes tables as JSON files:
///
/// ```text
/// <root>/<table>/patch=<patch>/set_mutator=<mutator>/rows.json
/// <root>/<table>_latest.json   (when publishing to latest)
/// <root>/<table>_pbe.json      (when publishing to pbe)
/// ```
#[derive(Debug, Clone)]
pub struct JsonPartitionWriter {
    root: PathBuf,
}

impl JsonPartitionWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn partition_dir(&self, table: &str, patch: &str, set_mutator: &str) -> PathBuf {
        self.root
            .join(table)
            .join(format!("patch={}", patch))
            .join(format!("set_mutator={}", set_mutator))
    }

    fn write_table<T: Serialize>(
        &self,
        table: &str,
        snapshot: &Snapshot,
        rows: &[T],
        targets: PublishTargets,
    ) -> Result<()> {
        let dir = self.partition_dir(table, snapshot.patch(), snapshot.set_mutator());
        fs::create_dir_all(&dir)?;
        let content = serde_json::to_string_pretty(rows)?;
        write_atomic(&dir.join("rows.json"), &content)?;

        if targets.latest {
            write_atomic(&self.root.join(format!("{}_latest.json", table)), &content)?;
        }
        if targets.pbe {
            write_atomic(&self.root.join(format!("{}_pbe.json", table)), &content)?;
        }
        info!("Wrote {} rows to {}", rows.len(), dir.display());
        Ok(())
    }
}

impl SnapshotSink for JsonPartitionWriter {
    fn write(&mut self, snapshot: &Snapshot, targets: PublishTargets) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        self.write_table("sets", snapshot, std::slice::from_ref(&snapshot.set), targets)?;
        self.write_table("traits", snapshot, &snapshot.traits, targets)?;
        self.write_table("champions", snapshot, &snapshot.champions, targets)?;
        self.write_table("augments", snapshot, &snapshot.augments, targets)?;
        self.write_table("items", snapshot, &snapshot.items, targets)?;
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SetRecord;
    use serde_json::Value;

    fn snapshot(patch: &str, set_name: &str) -> Snapshot {
        Snapshot {
            set: SetRecord {
                set_name: set_name.to_string(),
                set_number: "9".to_string(),
                set_mutator: "TFTSet9".to_string(),
                season_number: "9".to_string(),
                is_default: true,
                patch: patch.to_string(),
            },
            traits: Vec::new(),
            champions: Vec::new(),
            items: Vec::new(),
            augments: Vec::new(),
        }
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_writes_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonPartitionWriter::new(dir.path());
        writer
            .write(&snapshot("13.1", "Runeterra"), PublishTargets::default())
            .unwrap();

        for table in ["sets", "traits", "champions", "items", "augments"] {
            let rows = writer.partition_dir(table, "13.1", "TFTSet9").join("rows.json");
            assert!(rows.exists(), "missing {}", rows.display());
        }
        let sets = read(&writer.partition_dir("sets", "13.1", "TFTSet9").join("rows.json"));
        assert_eq!(sets[0]["set_name"], "Runeterra");
        assert!(!dir.path().join("sets_latest.json").exists());
    }

    #[test]
    fn test_overwrites_only_own_partition() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonPartitionWriter::new(dir.path());
        writer
            .write(&snapshot("13.1", "First"), PublishTargets::default())
            .unwrap();
        writer
            .write(&snapshot("13.2", "Other patch"), PublishTargets::default())
            .unwrap();
        writer
            .write(&snapshot("13.1", "Rerun"), PublishTargets::default())
            .unwrap();

        let rerun = read(&writer.partition_dir("sets", "13.1", "TFTSet9").join("rows.json"));
        let other = read(&writer.partition_dir("sets", "13.2", "TFTSet9").join("rows.json"));
        assert_eq!(rerun[0]["set_name"], "Rerun");
        assert_eq!(other[0]["set_name"], "Other patch");
    }

    #[test]
    fn test_publishes_pointers() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonPartitionWriter::new(dir.path());
        let targets = PublishTargets {
            latest: true,
            pbe: false,
        };
        writer.write(&snapshot("latest", "Runeterra"), targets).unwrap();

        let latest = read(&dir.path().join("sets_latest.json"));
        assert_eq!(latest[0]["patch"], "latest");
        assert!(dir.path().join("items_latest.json").exists());
        assert!(!dir.path().join("sets_pbe.json").exists());
    }
}
