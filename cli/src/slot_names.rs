//! Local slot-name store.
//!
//! Operators can give memory slots display names. The names live only on
//! this machine, as a single JSON blob under the `GBSControlSlotNames` key:
//!
//! ```json
//! { "GBSControlSlotNames": { "slot1": "SNES 240p", "slot4": "PS2" } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::constants::SLOT_NAMES_KEY;
use crate::protocol::Slot;

/// Slot display names backed by a JSON file.
#[derive(Debug, Clone)]
pub struct SlotNames {
    path: PathBuf,
    names: BTreeMap<String, String>,
}

impl SlotNames {
    /// Default store location inside the config directory.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Config::config_dir()?.join("slot_names.json"))
    }

    /// Open the store at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let names = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read slot names from {}", path.display()))?;
            parse_blob(&content)
                .with_context(|| format!("invalid slot names file {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, names })
    }

    /// Stored name for a slot id, if any.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Display name of a slot, falling back to its id.
    #[must_use]
    pub fn display_name(&self, slot: Slot) -> String {
        let id = slot.id();
        self.read(&id).map_or(id.clone(), str::to_string)
    }

    /// Store a name for a slot id and persist the blob.
    pub fn write(&mut self, key: &str, name: &str) -> Result<()> {
        self.names.insert(key.to_string(), name.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let inner: Map<String, Value> = self
            .names
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut blob = Map::new();
        blob.insert(SLOT_NAMES_KEY.to_string(), Value::Object(inner));

        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(blob))?)
            .with_context(|| format!("failed to write slot names to {}", self.path.display()))
    }
}

fn parse_blob(content: &str) -> Result<BTreeMap<String, String>> {
    let value: Value = serde_json::from_str(content)?;
    let names = value
        .get(SLOT_NAMES_KEY)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|name| (k.clone(), name.to_string())))
                .collect()
        })
        .unwrap_or_default();
    Ok(names)
}
