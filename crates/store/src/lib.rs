//! Durable registry snapshot storage.
//!
//! The whole monitor state that survives a restart lives in one JSON file
//! under `~/.config/taskscope/`. Live transport state is never written —
//! connections are not serializable, and restored feeds always come back
//! with no transport until the sync layer re-spawns one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use taskscope_core::{MessageEntry, UiPrefs};

pub const SNAPSHOT_FILE: &str = "monitor.json";

/// The persisted shape of the feed registry.
///
/// Content here is pruned to `PERSISTED_CONTENT_CAP` by the caller before
/// save; the live in-memory cap is larger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub feed_ids: Vec<String>,
    #[serde(default)]
    pub display_names: HashMap<String, String>,
    #[serde(default)]
    pub cursors: HashMap<String, u64>,
    #[serde(default)]
    pub pruned_content: HashMap<String, Vec<MessageEntry>>,
    #[serde(default)]
    pub active_feed_id: Option<String>,
    #[serde(default)]
    pub ui_prefs: UiPrefs,
}

pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("taskscope"))
}

pub fn snapshot_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SNAPSHOT_FILE))
}

/// Strict load: a missing file is an empty registry, but unreadable or
/// undecodable data is an error the caller can observe before it falls
/// back to empty.
pub fn try_load_from(path: &Path) -> Result<RegistrySnapshot> {
    if !path.exists() {
        return Ok(RegistrySnapshot::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Cannot decode {}", path.display()))
}

/// Load a snapshot from the given path.
///
/// Missing or malformed data is an empty registry, never an error that
/// blocks initialization.
pub fn load_from(path: &Path) -> RegistrySnapshot {
    try_load_from(path).unwrap_or_else(|e| {
        warn!("discarding snapshot: {e:#}");
        RegistrySnapshot::default()
    })
}

/// Write a snapshot to the given path, creating parent directories.
pub fn save_to(path: &Path, snapshot: &RegistrySnapshot) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content =
        serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
