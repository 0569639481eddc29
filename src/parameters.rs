//! Application parameters
//!
//! Parameters are the flat, dotted-key view of the application's settings
//! (`app.root_dir`, `migrations.default_connection`, ...). Values are
//! JSON-like trees so a key can name a scalar or a whole parameter set.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Read access to application parameters
pub trait ParameterStore {
    /// Look up a parameter by its full dotted key
    fn parameter(&self, key: &str) -> Option<&Value>;

    fn has_parameter(&self, key: &str) -> bool {
        self.parameter(key).is_some()
    }
}

impl ParameterStore for HashMap<String, Value> {
    fn parameter(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl ParameterStore for BTreeMap<String, Value> {
    fn parameter(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Parameter store with nested tables flattened into dotted keys
///
/// Inserting `migrations.reporting = { dir_name = "..." }` makes both
/// `migrations.reporting` (the whole table) and
/// `migrations.reporting.dir_name` addressable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from a nested tree such as a deserialized TOML document
    pub fn from_tree(tree: HashMap<String, Value>) -> Self {
        let mut parameters = Self::new();
        for (key, value) in tree {
            parameters.insert(key, value);
        }
        parameters
    }

    /// Insert a parameter, keeping nested and enclosing tables in step
    ///
    /// Table values have every nested key indexed, replacing whatever was
    /// indexed under `key` before. Enclosing tables already in the store
    /// are rewritten so the new value reads the same through any key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        let key = key.into();
        self.update_enclosing_tables(&key, &value);
        self.index(key, value);
        self
    }

    fn index(&mut self, key: String, value: Value) {
        let prefix = format!("{key}.");
        self.values.retain(|existing, _| !existing.starts_with(&prefix));
        if let Value::Object(table) = &value {
            for (child, child_value) in table {
                self.index(format!("{prefix}{child}"), child_value.clone());
            }
        }
        self.values.insert(key, value);
    }

    fn update_enclosing_tables(&mut self, key: &str, value: &Value) {
        let mut end = key.len();
        while let Some(dot) = key[..end].rfind('.') {
            if let Some(Value::Object(table)) = self.values.get_mut(&key[..dot]) {
                set_nested(table, &key[dot + 1..], value.clone());
            }
            end = dot;
        }
    }

    /// Builder-style variant of [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ParameterStore for Parameters {
    fn parameter(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

fn set_nested(table: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            table.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = table
                .entry(head)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set_nested(child, rest, value);
            }
        }
    }
}

/// Render a scalar parameter as text; tables and arrays have no text form
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
