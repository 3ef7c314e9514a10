//! All-time best score storage

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::{read_json, write_json_atomic};
use crate::error::Result;

/// Durable home of the best score
///
/// Implementations only need to store a single integer; the score manager
/// guarantees it only ever calls `save` with a larger value than before.
pub trait BestScoreStore: Send {
    /// Stored best, 0 when nothing has been saved yet
    fn load(&self) -> Result<u64>;
    fn save(&mut self, best: u64) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BestScoreDoc {
    best: u64,
}

/// Best score kept in a small JSON file
#[derive(Debug, Clone)]
pub struct BestScoreFile {
    path: PathBuf,
}

impl BestScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BestScoreStore for BestScoreFile {
    fn load(&self) -> Result<u64> {
        Ok(read_json::<BestScoreDoc>(&self.path)?
            .unwrap_or_default()
            .best)
    }

    fn save(&mut self, best: u64) -> Result<()> {
        write_json_atomic(&self.path, &BestScoreDoc { best })
    }
}

/// In-memory best score; clones share the same value
#[derive(Debug, Clone, Default)]
pub struct MemoryBestScore {
    best: Arc<AtomicU64>,
}

impl MemoryBestScore {
    pub fn new(best: u64) -> Self {
        Self {
            best: Arc::new(AtomicU64::new(best)),
        }
    }

    pub fn get(&self) -> u64 {
        self.best.load(Ordering::Acquire)
    }
}

impl BestScoreStore for MemoryBestScore {
    fn load(&self) -> Result<u64> {
        Ok(self.get())
    }

    fn save(&mut self, best: u64) -> Result<()> {
        self.best.store(best, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");

        let mut store = BestScoreFile::new(&path);
        assert_eq!(store.load().unwrap(), 0);
        store.save(420).unwrap();

        let reopened = BestScoreFile::new(&path);
        assert_eq!(reopened.load().unwrap(), 420);
    }

    #[test]
    fn test_memory_store_clones_share_value() {
        let store = MemoryBestScore::new(5);
        let mut writer = store.clone();
        writer.save(99).unwrap();
        assert_eq!(store.load().unwrap(), 99);
    }
}
