//! Word family dataset.
//!
//! The dataset document maps a family key (`"-AT"`) to an ordered list of
//! entries. Family order is the order the document lists them in and defines
//! the sequential traversal order of the deck.

use crate::error::{Result, WordFlipError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Default dataset file name, relative to the working directory.
pub const DEFAULT_DATASET_FILE: &str = "word-families.json";

/// One card of a word family: the onset plus optional media file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub onset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

impl WordEntry {
    pub fn new(onset: impl Into<String>) -> Self {
        Self {
            onset: onset.into(),
            image_file: None,
            audio_file: None,
        }
    }
}

/// Strip the separator characters from a family key.
///
/// `"-AT"` becomes `"AT"`, `"-ASH"` becomes `"ASH"`.
pub fn rime_of(key: &str) -> String {
    key.chars().filter(|&c| c != '-').collect()
}

/// An ordered list of entries sharing a rime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFamily {
    key: String,
    rime: String,
    entries: Vec<WordEntry>,
}

impl WordFamily {
    /// Build a family, computing its rime once from the key.
    pub fn new(key: impl Into<String>, entries: Vec<WordEntry>) -> Result<Self> {
        let key = key.into();
        if entries.is_empty() {
            return Err(WordFlipError::EmptyFamily(key));
        }
        let rime = rime_of(&key);
        Ok(Self { key, rime, entries })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rime(&self) -> &str {
        &self.rime
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&WordEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true for a family built through [`WordFamily::new`].
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All word families, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDataset {
    families: Vec<WordFamily>,
}

impl WordDataset {
    /// Build a dataset from already-validated families.
    pub fn new(families: Vec<WordFamily>) -> Result<Self> {
        if families.is_empty() {
            return Err(WordFlipError::EmptyDataset);
        }
        Ok(Self { families })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Validate a parsed dataset document.
    pub fn from_value(value: Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(WordFlipError::MalformedEntry {
                    family: String::new(),
                    reason: format!("expected an object of families, found {}", kind(&other)),
                })
            }
        };
        Self::from_map(map)
    }

    fn from_map(map: Map<String, Value>) -> Result<Self> {
        if map.is_empty() {
            return Err(WordFlipError::EmptyDataset);
        }

        let mut families = Vec::with_capacity(map.len());
        for (key, value) in map {
            let items = match value {
                Value::Array(items) => items,
                other => {
                    return Err(WordFlipError::MalformedEntry {
                        reason: format!("expected a list of entries, found {}", kind(&other)),
                        family: key,
                    })
                }
            };

            let mut entries = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                entries.push(parse_entry(&key, i, item)?);
            }
            families.push(WordFamily::new(key, entries)?);
        }

        log::debug!("loaded {} word families", families.len());
        Self::new(families)
    }

    /// Family keys in traversal order.
    pub fn family_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.families.iter().map(|f| f.key())
    }

    pub fn family(&self, key: &str) -> Result<&WordFamily> {
        self.families
            .iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| WordFlipError::UnknownFamily(key.to_string()))
    }

    pub fn family_at(&self, index: usize) -> Option<&WordFamily> {
        self.families.get(index)
    }

    pub fn index_of(&self, key: &str) -> Result<usize> {
        self.families
            .iter()
            .position(|f| f.key() == key)
            .ok_or_else(|| WordFlipError::UnknownFamily(key.to_string()))
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Entry count of the family at `index`, zero when out of range.
    pub fn entry_count(&self, index: usize) -> usize {
        self.families.get(index).map_or(0, WordFamily::len)
    }

    pub fn families(&self) -> &[WordFamily] {
        &self.families
    }
}

fn parse_entry(family: &str, index: usize, item: Value) -> Result<WordEntry> {
    let fields = match item {
        Value::Object(fields) => fields,
        other => {
            return Err(WordFlipError::MalformedEntry {
                family: family.to_string(),
                reason: format!("entry {} is {}, not an object", index, kind(&other)),
            })
        }
    };

    let onset = match fields.get("onset") {
        Some(Value::String(onset)) => onset.clone(),
        Some(other) => {
            return Err(WordFlipError::MalformedEntry {
                family: family.to_string(),
                reason: format!("entry {} has a non-string onset ({})", index, kind(other)),
            })
        }
        None => {
            return Err(WordFlipError::MalformedEntry {
                family: family.to_string(),
                reason: format!("entry {} is missing an onset", index),
            })
        }
    };

    // Decorative fields degrade to None rather than failing the load.
    let text_field = |name: &str| match fields.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(_)) | None => None,
        Some(other) => {
            log::warn!(
                "family {} entry {}: ignoring non-string {} ({})",
                family,
                index,
                name,
                kind(other)
            );
            None
        }
    };

    Ok(WordEntry {
        onset,
        image_file: text_field("imageFile"),
        audio_file: text_field("audioFile"),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
