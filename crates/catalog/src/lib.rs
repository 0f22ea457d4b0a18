use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPosition {
    pub x: f64,
    pub y: f64,
}

/// Widget properties persisted by the host between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyBag {
    /// Dragged card positions keyed by entity id.
    pub card_positions: BTreeMap<String, CardPosition>,
    pub current_page: usize,
    pub page_size: usize,
    pub custom_template: Option<String>,
}

impl Default for PropertyBag {
    fn default() -> Self {
        Self {
            card_positions: BTreeMap::new(),
            current_page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            custom_template: None,
        }
    }
}

impl PropertyBag {
    pub fn from_json(raw: &str) -> Result<Self, PropertyError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|e| PropertyError::Corrupt(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, PropertyError> {
        serde_json::to_string_pretty(self).map_err(|e| PropertyError::Io(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyError::Corrupt(msg) => write!(f, "property storage corrupt: {msg}"),
            PropertyError::Io(msg) => write!(f, "property storage error: {msg}"),
        }
    }
}

impl std::error::Error for PropertyError {}

pub trait PropertyStore {
    fn load(&self) -> Result<PropertyBag, PropertyError>;
    fn save(&mut self, bag: &PropertyBag) -> Result<(), PropertyError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPropertyStore {
    bag: PropertyBag,
    saves: usize,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bag(bag: PropertyBag) -> Self {
        Self { bag, saves: 0 }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn load(&self) -> Result<PropertyBag, PropertyError> {
        Ok(self.bag.clone())
    }

    fn save(&mut self, bag: &PropertyBag) -> Result<(), PropertyError> {
        self.bag = bag.clone();
        self.saves += 1;
        Ok(())
    }
}

/// Properties kept as a pretty-printed JSON file.
///
/// A missing file loads as the default bag.
#[derive(Debug, Clone)]
pub struct JsonFilePropertyStore {
    path: PathBuf,
}

impl JsonFilePropertyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertyStore for JsonFilePropertyStore {
    fn load(&self) -> Result<PropertyBag, PropertyError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no property file, using defaults");
                return Ok(PropertyBag::default());
            }
            Err(e) => return Err(PropertyError::Io(e.to_string())),
        };
        PropertyBag::from_json(&raw)
    }

    fn save(&mut self, bag: &PropertyBag) -> Result<(), PropertyError> {
        let raw = bag.to_json()?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PropertyError::Io(e.to_string()))?;
        }
        std::fs::write(&self.path, raw).map_err(|e| PropertyError::Io(e.to_string()))?;
        debug!(
            path = %self.path.display(),
            positions = bag.card_positions.len(),
            "properties saved"
        );
        Ok(())
    }
}
