//! Record and field set types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered column set persisted for every record
///
/// The first field is the primary identifier. It is required on submit and
/// is always stored as a text cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<String>,
}

impl FieldSet {
    /// Build a field set. Returns `None` when empty or when a name repeats.
    pub fn new<I, S>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() || fields.iter().any(|f| f.is_empty()) {
            return None;
        }
        for (i, name) in fields.iter().enumerate() {
            if fields[..i].contains(name) {
                return None;
            }
        }
        Some(Self { fields })
    }

    /// Parse a comma-separated list such as `voucher,box,site`
    pub fn parse(list: &str) -> Option<Self> {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    /// Name of the identifier column
    pub fn identifier(&self) -> &str {
        &self.fields[0]
    }

    /// Column names in persisted order
    pub fn names(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            fields: vec!["voucher".to_string(), "box".to_string(), "site".to_string()],
        }
    }
}

/// One delivery receipt
///
/// Only values for recognized fields are kept; missing fields are written
/// as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Collect a record for `fields`, asking `lookup` for each key
    ///
    /// Unknown keys are never asked for, so they are dropped. An empty
    /// identifier falls through to `aliases`, in order.
    pub fn collect<F>(fields: &FieldSet, aliases: &[String], mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut record = Self::new();

        for name in fields.names() {
            let mut value = lookup(name).filter(|v| !v.is_empty());
            if value.is_none() && name == fields.identifier() {
                value = aliases
                    .iter()
                    .find_map(|alias| lookup(alias).filter(|v| !v.is_empty()));
            }
            if let Some(value) = value {
                record.set(name.as_str(), value);
            }
        }

        record
    }

    /// Collect a record from a JSON object
    pub fn from_json(
        object: &serde_json::Map<String, Value>,
        fields: &FieldSet,
        aliases: &[String],
    ) -> Self {
        Self::collect(fields, aliases, |key| object.get(key).and_then(json_text))
    }

    /// Identifier value, if present and non-empty
    pub fn identifier<'a>(&'a self, fields: &FieldSet) -> Option<&'a str> {
        self.get(fields.identifier()).filter(|v| !v.is_empty())
    }

    /// Row cells in `fields` order
    pub fn project(&self, fields: &FieldSet) -> Vec<String> {
        fields
            .names()
            .iter()
            .map(|name| self.get(name).unwrap_or_default().to_string())
            .collect()
    }
}

/// Text form of a JSON value; `null` counts as absent
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
