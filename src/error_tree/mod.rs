//! Structural model of validation-error payloads of unknown shape.
//!
//! Any JSON-like value classifies into an [`ErrorTree`] without failing:
//! `null` is [`ErrorTree::Empty`], arrays become [`ErrorTree::Sequence`],
//! objects become [`ErrorTree::Keyed`] (enumeration order kept) and every other
//! value is a [`Scalar`] leaf. Rendering lives in [`render`].

mod render;


use std::fmt::{Display, Formatter};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};

pub use render::{EntryContent, EntryKey, ListEntry, Rendered, render};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ErrorTree {
    #[default]
    Empty,
    Leaf(Scalar),
    Sequence(Vec<ErrorTree>),
    Keyed(Vec<(String, ErrorTree)>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Bool(bool),
}

impl ErrorTree {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => ErrorTree::Empty,
            Value::Bool(flag) => ErrorTree::Leaf(Scalar::Bool(*flag)),
            Value::Number(number) => ErrorTree::Leaf(Scalar::Number(number.clone())),
            Value::String(text) => ErrorTree::Leaf(Scalar::Text(text.clone())),
            Value::Array(items) => ErrorTree::Sequence(items.iter().map(Self::from_value).collect()),
            Value::Object(entries) => ErrorTree::Keyed(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_value(value)))
                    .collect(),
            ),
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        ErrorTree::Leaf(Scalar::Text(message.into()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ErrorTree::Empty)
    }

    /// Top-level entry of a keyed tree. Never descends.
    pub fn get(&self, key: &str) -> Option<&ErrorTree> {
        match self {
            ErrorTree::Keyed(entries) => entries
                .iter()
                .find_map(|(entry_key, value)| (entry_key == key).then_some(value)),
            _ => None,
        }
    }

    /// Shallow field lookup: only top-level keys with a non-empty value count.
    pub fn is_field_invalid(&self, name: impl AsRef<str>) -> bool {
        self.get(name.as_ref()).is_some_and(|value| !value.is_empty())
    }

    pub fn to_value(&self) -> Value {
        match self {
            ErrorTree::Empty => Value::Null,
            ErrorTree::Leaf(scalar) => scalar.to_value(),
            ErrorTree::Sequence(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            ErrorTree::Keyed(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for ErrorTree {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl From<Option<Value>> for ErrorTree {
    fn from(value: Option<Value>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl Serialize for ErrorTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ErrorTree::Empty => serializer.serialize_unit(),
            ErrorTree::Leaf(scalar) => scalar.serialize(serializer),
            ErrorTree::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ErrorTree::Keyed(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl Scalar {
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Text(text) => Value::String(text.clone()),
            Scalar::Number(number) => Value::Number(number.clone()),
            Scalar::Bool(flag) => Value::Bool(*flag),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Text(text) => serializer.serialize_str(text),
            Scalar::Number(number) => number.serialize(serializer),
            Scalar::Bool(flag) => serializer.serialize_bool(*flag),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Bool(flag) => write!(f, "{flag}"),
            Scalar::Number(number) => match number.as_f64() {
                Some(float)
                    if !number.is_i64()
                        && !number.is_u64()
                        && float.is_finite()
                        && float.fract() == 0.0
                        && float.abs() < 1e21 =>
                {
                    write!(f, "{float:.0}")
                }
                _ => write!(f, "{number}"),
            },
        }
    }
}
