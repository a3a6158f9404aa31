//! Snapshot wire format
//!
//! ```text
//! { originalDimension: {width, height},
//!   emitters: [ { id, settings: {...}, molecules: [ { id, settings: {...} } ] } ] }
//! ```
//!
//! Settings stay as raw JSON maps here so that decoding into typed records can
//! ignore bad fields instead of rejecting the whole snapshot. Older snapshots
//! store molecules as flat settings objects and may omit ids; both forms are
//! accepted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Viewport size a snapshot was exported at
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    pub width: f32,
    pub height: f32,
}

impl Dimension {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both sides strictly positive and finite
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Full serializable scene state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub original_dimension: Dimension,
    pub emitters: Vec<EmitterState>,
}

impl Snapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Pretty-printed JSON text
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Total molecule entries across emitters
    pub fn molecule_count(&self) -> usize {
        self.emitters.iter().map(|e| e.molecules.len()).sum()
    }
}

/// One emitter subtree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterState {
    #[serde(deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub settings: Map<String, Value>,
    pub molecules: Vec<MoleculeState>,
}

/// One molecule entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "MoleculeEntry")]
pub struct MoleculeState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub settings: Map<String, Value>,
}

impl MoleculeState {
    pub fn new(id: impl Into<String>, settings: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            settings,
        }
    }
}

/// Accepted molecule entry shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum MoleculeEntry {
    Wrapped {
        #[serde(default)]
        id: Option<Value>,
        settings: Map<String, Value>,
    },
    Flat(Map<String, Value>),
}

impl From<MoleculeEntry> for MoleculeState {
    fn from(entry: MoleculeEntry) -> Self {
        match entry {
            MoleculeEntry::Wrapped { id, settings } => Self {
                id: id.as_ref().and_then(id_from_value),
                settings,
            },
            MoleculeEntry::Flat(mut settings) => {
                let id = settings.remove("id").as_ref().and_then(id_from_value);
                Self { id, settings }
            }
        }
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Ids may be strings or numbers; anything else counts as missing
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}
