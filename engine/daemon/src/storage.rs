//! Save file I/O
//!
//! Saves are written to a sibling temp file and renamed into place so a
//! crash mid-write never leaves a truncated save behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use pet_engine_core::SaveData;

/// `$XDG_DATA_HOME/pet-engine/save.json`
pub fn default_save_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pet-engine")
        .join("save.json")
}

/// Read and migrate a save; `None` if the file does not exist
pub fn load(path: &Path, now: DateTime<Utc>) -> Result<Option<SaveData>> {
    if !path.exists() {
        debug!(path = ?path, "No save file");
        return Ok(None);
    }

    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read save: {path:?}"))?;
    let save = SaveData::from_json(&json, now)
        .with_context(|| format!("Failed to parse save: {path:?}"))?;

    info!(path = ?path, version = save.version, "Save loaded");
    Ok(Some(save))
}

/// Write a save atomically
pub fn write(path: &Path, save: &SaveData) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create save directory: {parent:?}"))?;
    }

    let json = save.to_json().context("Failed to serialize save")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write save: {tmp:?}"))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace save: {path:?}"))?;

    debug!(path = ?path, "Save written");
    Ok(())
}
