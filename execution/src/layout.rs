//! Saved bet layouts.
//!
//! A layout is the JSON array of [`PlacedBet`]s that were on the table when it was saved,
//! stored under a string key. Ids in a stored layout are never reused; loading replays each
//! bet under a fresh id.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use roulette_neo_types::{LayoutError, PlacedBet};
use tracing::debug;

pub trait LayoutStore: Send {
    fn save(&mut self, key: &str, bets: &[PlacedBet]) -> Result<(), LayoutError>;

    /// `Ok(None)` when nothing was saved under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<PlacedBet>>, LayoutError>;
}

fn storage_error(err: anyhow::Error) -> LayoutError {
    LayoutError::Storage(format!("{err:#}"))
}

/// Keeps layouts as serialized JSON in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLayoutStore {
    layouts: HashMap<String, String>,
}

impl LayoutStore for MemoryLayoutStore {
    fn save(&mut self, key: &str, bets: &[PlacedBet]) -> Result<(), LayoutError> {
        let encoded = serde_json::to_string(bets)
            .context("encode layout")
            .map_err(storage_error)?;
        self.layouts.insert(key.to_string(), encoded);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<PlacedBet>>, LayoutError> {
        let Some(encoded) = self.layouts.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(encoded)
            .context("decode layout")
            .map(Some)
            .map_err(storage_error)
    }
}

/// One `<key>.json` file per layout under a directory.
#[derive(Clone, Debug)]
pub struct JsonFileLayoutStore {
    dir: PathBuf,
}

impl JsonFileLayoutStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl LayoutStore for JsonFileLayoutStore {
    fn save(&mut self, key: &str, bets: &[PlacedBet]) -> Result<(), LayoutError> {
        let path = self.path_for(key);
        let write = || -> anyhow::Result<()> {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("create {}", self.dir.display()))?;
            let encoded = serde_json::to_vec_pretty(bets).context("encode layout")?;
            // Write then rename so a crash never leaves a truncated layout behind.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, encoded).with_context(|| format!("write {}", tmp.display()))?;
            fs::rename(&tmp, &path).with_context(|| format!("rename to {}", path.display()))?;
            Ok(())
        };
        write().map_err(storage_error)?;
        debug!(path = %path.display(), count = bets.len(), "layout saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<PlacedBet>>, LayoutError> {
        let path = self.path_for(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(storage_error(
                    anyhow::Error::new(err).context(format!("read {}", path.display())),
                ))
            }
        };
        serde_json::from_slice(&raw)
            .with_context(|| format!("decode {}", path.display()))
            .map(Some)
            .map_err(storage_error)
    }
}
