//! Persistence of the last displayed `{style, shape}` pair.
//!
//! Records are stored as one flat JSON object under a single key of a
//! [`KeyValueStore`]. Loading never fails: a missing record, or one that is
//! not a JSON object, reads as absent. Inside an object every field is read
//! on its own, so a field that is missing, of the wrong type or out of range
//! is replaced by its default without touching the others.

use std::{collections::HashMap, path::PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    shape::ShapeKind,
    style::{
        BorderPattern, Color, VisualStyle, MAX_BORDER_WIDTH, MAX_SIZE, MIN_BORDER_WIDTH,
        MIN_SIZE, RESTING_SCALE,
    },
    AlchemyError, Result,
};

/// Minimal string key-value storage, modelled on browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, mostly for tests and previews.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store holding one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AlchemyError::msg(format!("invalid storage key `{key}`")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// The persisted `{style, shape}` pair after default-filling.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub style: VisualStyle,
    pub shape: ShapeKind,
}

impl PersistedRecord {
    pub fn new(style: VisualStyle, shape: ShapeKind) -> Self {
        Self { style, shape }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&WireRecord::from(self))?)
    }

    /// Parses a stored record, filling gaps from `defaults`. Returns `None`
    /// only when `raw` is not a JSON object.
    pub fn from_json(raw: &str, defaults: &VisualStyle) -> Option<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Some(StoredRecord::read(&fields).resolve(defaults)),
            Ok(other) => {
                tracing::warn!(
                    kind = json_kind(&other),
                    "discarding style record that is not an object"
                );
                None
            }
            Err(err) => {
                tracing::warn!("discarding unreadable style record: {}", err);
                None
            }
        }
    }
}

/// Form written to the store. Whole-degree and pixel fields stay integers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord<'a> {
    background_color: &'a str,
    border_color: &'a str,
    border_width: u8,
    border_style: &'static str,
    size: u16,
    rotation: u32,
    scale: f32,
    shape: &'static str,
}

impl<'a> From<&'a PersistedRecord> for WireRecord<'a> {
    fn from(record: &'a PersistedRecord) -> Self {
        let style = &record.style;
        Self {
            background_color: style.fill.as_str(),
            border_color: style.border_color.as_str(),
            border_width: style.border_width,
            border_style: style.border_pattern.as_css(),
            size: style.size,
            rotation: style.display_rotation(),
            scale: style.scale,
            shape: record.shape.name(),
        }
    }
}

/// Fields pulled out of a stored object, each one optional.
#[derive(Debug)]
struct StoredRecord {
    background_color: Option<String>,
    border_color: Option<String>,
    border_width: Option<f64>,
    border_style: Option<String>,
    size: Option<f64>,
    rotation: Option<f64>,
    scale: Option<f64>,
    shape: Option<String>,
}

impl StoredRecord {
    fn read(fields: &Map<String, Value>) -> Self {
        Self {
            background_color: text_field(fields, "backgroundColor"),
            border_color: text_field(fields, "borderColor"),
            border_width: number_field(fields, "borderWidth"),
            border_style: text_field(fields, "borderStyle"),
            size: number_field(fields, "size"),
            rotation: number_field(fields, "rotation"),
            scale: number_field(fields, "scale"),
            shape: text_field(fields, "shape"),
        }
    }

    fn resolve(self, defaults: &VisualStyle) -> PersistedRecord {
        let finite = |value: Option<f64>| value.filter(|v| v.is_finite());

        let shape = match self.shape.as_deref() {
            Some(name) => ShapeKind::from_name(name).unwrap_or_else(|| {
                tracing::debug!(name, "unknown stored shape, using circle");
                ShapeKind::Circle
            }),
            None => ShapeKind::Circle,
        };

        let style = VisualStyle {
            fill: self
                .background_color
                .map(Color::new)
                .unwrap_or_else(|| defaults.fill.clone()),
            border_color: self
                .border_color
                .map(Color::new)
                .unwrap_or_else(|| defaults.border_color.clone()),
            border_width: finite(self.border_width)
                .map(|w| {
                    w.round()
                        .clamp(f64::from(MIN_BORDER_WIDTH), f64::from(MAX_BORDER_WIDTH))
                        as u8
                })
                .unwrap_or(defaults.border_width),
            border_pattern: self
                .border_style
                .as_deref()
                .and_then(BorderPattern::from_css)
                .unwrap_or(defaults.border_pattern),
            size: finite(self.size)
                .map(|s| s.round().clamp(f64::from(MIN_SIZE), f64::from(MAX_SIZE)) as u16)
                .unwrap_or(defaults.size),
            rotation: finite(self.rotation)
                .map(|r| r.round().rem_euclid(360.0) as u32 % 360)
                .unwrap_or(0),
            scale: finite(self.scale)
                .filter(|s| *s > 0.0)
                .map(|s| s as f32)
                .unwrap_or(RESTING_SCALE),
        };

        PersistedRecord { style, shape }
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => {
            tracing::debug!(
                key,
                kind = json_kind(other),
                "ignoring stored field of wrong type"
            );
            None
        }
    }
}

/// Numbers are accepted as JSON numbers or numeric strings.
fn number_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let parsed = match fields.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Null => return None,
        _ => None,
    };
    if parsed.is_none() {
        tracing::debug!(key, "ignoring stored field that is not a number");
    }
    parsed
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads and writes the style record under one key.
#[derive(Debug)]
pub struct StylePersistence<K> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> StylePersistence<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn into_store(self) -> K {
        self.store
    }

    /// Loads the last record. Storage failures and corrupt data are logged
    /// and read as "nothing saved".
    pub fn load(&self, defaults: &VisualStyle) -> Option<PersistedRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(key = %self.key, "failed to read style record: {}", err);
                return None;
            }
        };
        PersistedRecord::from_json(&raw, defaults)
    }

    pub fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        let json = record.to_json()?;
        self.store.set(&self.key, &json)?;
        tracing::trace!(key = %self.key, shape = %record.shape, "saved style record");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(&self.key)
    }
}
