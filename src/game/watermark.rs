//! Durable record of the highest quest ordinal ever completed per zone.
//!
//! Content generation reads this to know how far ahead of the players it
//! must stay. Values are monotonically non-decreasing and the whole table
//! is rewritten on every raise, so a crash never loses more than the raise
//! in flight.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::game::errors::GameError;
use crate::game::types::ZoneId;

pub const WATERMARK_FILENAME: &str = "quest_watermarks.json";

/// Per-zone maxima of completed quest ordinals, backed by a JSON file.
#[derive(Debug)]
pub struct WatermarkTracker {
    path: PathBuf,
    data: BTreeMap<ZoneId, u16>,
}

impl WatermarkTracker {
    /// Load the watermark table from `path`. A missing file yields an empty
    /// table; the file is created lazily on the first raise.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, GameError> {
        let path = path.into();
        let data = if path.is_file() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, data })
    }

    /// Conventional location of the watermark file inside a data directory.
    pub fn default_path(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(WATERMARK_FILENAME)
    }

    /// Highest quest ordinal ever completed in `zone`.
    pub fn get(&self, zone: ZoneId) -> Option<u16> {
        self.data.get(&zone).copied()
    }

    /// Raise the watermark for `zone` to `number` if it exceeds the stored
    /// value, persisting the full table on every raise. Returns whether the
    /// watermark moved. Decreases are never applied.
    pub fn update(&mut self, zone: ZoneId, number: u16) -> Result<bool, GameError> {
        let current = self.data.get(&zone).copied();
        if current.is_some_and(|c| c >= number) {
            return Ok(false);
        }
        self.data.insert(zone, number);
        self.save()?;
        debug!("watermark for zone {zone} raised to {number}");
        Ok(true)
    }

    /// Write the table out. Called automatically on every raise; exposed so
    /// process shutdown can force a final write.
    pub fn save(&self) -> Result<(), GameError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&self.data)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, u16)> + '_ {
        self.data.iter().map(|(z, n)| (*z, *n))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let tracker = WatermarkTracker::load(dir.path().join("none.json")).expect("load");
        assert!(tracker.is_empty());
        assert_eq!(tracker.get(3), None);
    }

    #[test]
    fn stored_value_is_the_maximum_ever_passed() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(WATERMARK_FILENAME);
        let mut tracker = WatermarkTracker::load(&path).expect("load");

        assert!(tracker.update(7, 3).expect("raise"));
        assert!(!tracker.update(7, 1).expect("no decrease"));
        assert!(!tracker.update(7, 3).expect("no equal raise"));
        assert!(tracker.update(7, 8).expect("raise"));
        assert_eq!(tracker.get(7), Some(8));

        // Every raise persisted; a reload sees the maximum.
        let reloaded = WatermarkTracker::load(&path).expect("reload");
        assert_eq!(reloaded.get(7), Some(8));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn zones_are_tracked_independently() {
        let dir = TempDir::new().expect("tempdir");
        let mut tracker =
            WatermarkTracker::load(dir.path().join(WATERMARK_FILENAME)).expect("load");
        tracker.update(1, 5).expect("raise");
        tracker.update(2, 2).expect("raise");
        assert_eq!(tracker.get(1), Some(5));
        assert_eq!(tracker.get(2), Some(2));
    }
}
