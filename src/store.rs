//! Persist the player record as JSON (platform config dir, or an explicit file).

use crate::player::Player;
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILENAME: &str = "player.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid player record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory on this platform")]
    NoConfigDir,
}

/// Load-at-start, save-on-demand storage for the player record.
pub trait ProgressionStore {
    fn load(&self) -> Result<Player, StoreError>;
    fn save(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Load, falling back to a fresh record when nothing usable is stored.
    fn load_or_default(&self) -> Player {
        self.load().unwrap_or_else(|err| {
            log::warn!("could not load player record, starting fresh: {err}");
            Player::default()
        })
    }
}

/// Pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/player.json`, e.g. `~/.config/fruitcrushtui/player.json` on Linux.
    pub fn default_location() -> Result<Self, StoreError> {
        ProjectDirs::from("io.github", "fruitcrush", "FruitCrushTui")
            .map(|dirs| Self::new(dirs.config_dir().join(FILENAME)))
            .ok_or(StoreError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressionStore for JsonFileStore {
    /// A missing file is a new player, not an error.
    fn load(&self) -> Result<Player, StoreError> {
        if !self.path.is_file() {
            return Ok(Player::default());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&mut self, player: &Player) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(player)?;
        fs::write(&self.path, data)?;
        log::debug!("saved player record to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and `--no-save` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    player: Option<Player>,
    saves: usize,
}

impl MemoryStore {
    pub fn with_player(player: Player) -> Self {
        Self {
            player: Some(player),
            saves: 0,
        }
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl ProgressionStore for MemoryStore {
    fn load(&self) -> Result<Player, StoreError> {
        Ok(self.player.clone().unwrap_or_default())
    }

    fn save(&mut self, player: &Player) -> Result<(), StoreError> {
        self.player = Some(player.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert_eq!(store.load().unwrap(), Player::default());
        let mut p = Player::default();
        p.coins = 999;
        store.save(&p).unwrap();
        assert_eq!(store.load().unwrap().coins, 999);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_missing_file_is_new_player() {
        let store = JsonFileStore::new(std::env::temp_dir().join("fruitcrushtui-no-such-dir/player.json"));
        assert_eq!(store.load().unwrap(), Player::default());
    }
}
