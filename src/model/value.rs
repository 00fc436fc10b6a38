//! The value record: an ordered mapping from field name to value.
//!
//! The textual form is a JSON object. Field values are strings, booleans or
//! numbers; `null` means "no value". The reserved key `_styles` carries the
//! user's per-field [`StyleOverride`]s.
//!
//! ```
//! use formfill::model::{FieldValue, ValueRecord};
//!
//! let record = ValueRecord::parse(r#"{"CharacterName": "Mira", "Check Box 11": true}"#)?;
//! assert_eq!(record.get("CharacterName"), Some(&FieldValue::Text("Mira".into())));
//! assert!(record.get("Check Box 11").is_some_and(|v| v.is_checked()));
//! # Ok::<(), formfill::Error>(())
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use super::style::{StyleOverride, StyleOverrides};
use crate::error::{Error, Result};

/// Reserved record key holding user style overrides.
pub const STYLES_KEY: &str = "_styles";

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text, possibly multiline
    Text(String),
    /// Checkbox state
    Flag(bool),
    /// Numeric value, rendered with its JSON spelling
    Number(Number),
}

impl FieldValue {
    /// Whether a checkbox should render as checked.
    pub fn is_checked(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => s == "true",
            FieldValue::Number(_) => false,
        }
    }

    /// Text shown in a text field.
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
        }
    }

    /// Boolean spellings stored against a text field are not shown.
    pub fn is_boolean_like(&self) -> bool {
        match self {
            FieldValue::Flag(_) => true,
            FieldValue::Text(s) => s == "true" || s == "false",
            FieldValue::Number(_) => false,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Flag(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Number(n.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// Ordered field values plus user style overrides.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueRecord {
    values: IndexMap<String, FieldValue>,
    styles: StyleOverrides,
}

impl ValueRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the textual form.
    ///
    /// Fails with [`Error::ValueRecordParse`] when the text is not a JSON
    /// object, a value is an array or object, or `_styles` is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value =
            serde_json::from_str(text).map_err(|e| Error::ValueRecordParse(e.to_string()))?;
        let Value::Object(map) = root else {
            return Err(Error::ValueRecordParse(
                "top level must be a JSON object".to_string(),
            ));
        };

        let mut record = ValueRecord::new();
        for (key, value) in map {
            if key == STYLES_KEY {
                record.styles = parse_styles(value)?;
                continue;
            }
            let value = match value {
                Value::Null => continue,
                Value::String(s) => FieldValue::Text(s),
                Value::Bool(b) => FieldValue::Flag(b),
                Value::Number(n) => FieldValue::Number(n),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::ValueRecordParse(format!(
                        "value of '{}' must be a string, boolean or number",
                        key
                    )));
                }
            };
            record.values.insert(key, value);
        }
        Ok(record)
    }

    /// Serialize to the textual form: JSON pretty-printed with 4-space
    /// indentation, entries in insertion order, `_styles` last.
    pub fn to_text(&self) -> String {
        let mut map = Map::new();
        for (key, value) in &self.values {
            map.insert(key.clone(), value.to_json());
        }
        let styles: StyleOverrides = self
            .styles
            .iter()
            .filter(|(_, style)| !style.is_empty())
            .map(|(name, style)| (name.clone(), style.clone()))
            .collect();
        if !styles.is_empty() {
            let styles = serde_json::to_value(&styles).unwrap_or(Value::Null);
            map.insert(STYLES_KEY.to_string(), styles);
        }

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        if serde::Serialize::serialize(&Value::Object(map), &mut ser).is_err() {
            return String::from("{}");
        }
        String::from_utf8(out).unwrap_or_else(|_| String::from("{}"))
    }

    /// Value for a field, if present.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Whether a field has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or replace a value, keeping the original position on replace.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a value, preserving the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.shift_remove(name)
    }

    /// Iterate over values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of field values (not counting styles).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no field values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// User style overrides.
    pub fn styles(&self) -> &StyleOverrides {
        &self.styles
    }

    /// Mutable access to user style overrides.
    pub fn styles_mut(&mut self) -> &mut StyleOverrides {
        &mut self.styles
    }

    /// User override for one field.
    pub fn style_for(&self, name: &str) -> Option<&StyleOverride> {
        self.styles.get(name)
    }
}

fn parse_styles(value: Value) -> Result<StyleOverrides> {
    match value {
        Value::Null => Ok(StyleOverrides::new()),
        Value::Object(_) => {
            let mut styles: StyleOverrides = serde_json::from_value(value)
                .map_err(|e| Error::ValueRecordParse(format!("{}: {}", STYLES_KEY, e)))?;
            styles.retain(|_, style| !style.is_empty());
            Ok(styles)
        }
        _ => Err(Error::ValueRecordParse(format!(
            "{} must be an object",
            STYLES_KEY
        ))),
    }
}
