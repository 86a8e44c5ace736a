//! Save/resume persistence
//!
//! A single JSON snapshot under one key. Every operation is best-effort:
//! failures are logged and the game carries on without a save.

pub mod snapshot;
pub mod storage;

pub use snapshot::{Snapshot, SnapshotError};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{MemoryStorage, Storage, StorageError};

use crate::consts::STORAGE_KEY;

/// Snapshot persistence over a key-value [`Storage`]
#[derive(Debug, Clone)]
pub struct SaveStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> SaveStore<S> {
    /// Save under [`STORAGE_KEY`]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: STORAGE_KEY.to_string(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write `snapshot`; errors are logged, never returned
    pub fn save(&self, snapshot: &Snapshot) {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize game state: {}", e);
                return;
            }
        };
        match self.storage.set_item(&self.key, &json) {
            Ok(()) => log::debug!(
                "Game saved (level {}, score {})",
                snapshot.level,
                snapshot.score
            ),
            Err(e) => log::warn!("Failed to save game state: {}", e),
        }
    }

    /// Read the saved snapshot; any failure reads as "no save"
    pub fn load(&self) -> Option<Snapshot> {
        let json = match self.storage.get_item(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No saved game found, starting fresh");
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read saved game: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&json) {
            Ok(snapshot) if snapshot.cards.is_empty() => {
                log::info!("Saved game has no cards, starting fresh");
                None
            }
            Ok(snapshot) => {
                log::info!("Loaded saved game (level {})", snapshot.level);
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("Failed to parse saved game: {}", e);
                None
            }
        }
    }

    /// Remove the saved snapshot; errors are logged, never returned
    pub fn clear(&self) {
        match self.storage.remove_item(&self.key) {
            Ok(()) => log::info!("Saved game cleared"),
            Err(e) => log::warn!("Failed to clear saved game: {}", e),
        }
    }
}
