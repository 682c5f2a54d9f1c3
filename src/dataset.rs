//! In-memory telemetry table
//!
//! A [`Dataset`] is a rectangular batch of records: every row carries one
//! [`Value`] per field, in header order. Loaders are responsible for padding
//! absent cells with [`Value::Null`].

use std::fmt;

/// A single cell as it arrived from the telemetry source
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Defensive numeric coercion
    ///
    /// Returns `None` for anything that is not a usable finite number: nulls,
    /// empty or unparsable text, `NaN` and infinities. Booleans count as 1/0.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Value::Null => return None,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        number.is_finite().then_some(number)
    }

    /// Text form used for region matching; `None` for nulls
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            // Nested structures are not telemetry values
            other => Value::Text(other.to_string()),
        }
    }
}

/// Ordered, rectangular collection of telemetry records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    fields: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given header
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    /// Append a record, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.fields.len(), Value::Null);
        self.rows.push(row);
    }

    /// Field names in column order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column position of a field (exact name)
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Iterate the values of one field, top to bottom
    ///
    /// Yields nothing if the field does not exist.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.field_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)))
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}
