use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::controller::{FieldKey, FormError, FormResult, FormValues};

/// Pure, synchronous validity predicate over the current values.
pub trait FormValidator: Send + Sync {
    fn validate(&self, values: &FormValues) -> bool;
}

impl<F> FormValidator for F
where
    F: Fn(&FormValues) -> bool + Send + Sync,
{
    fn validate(&self, values: &FormValues) -> bool {
        (self)(values)
    }
}

/// Valid when every listed field holds something other than `null`, an empty
/// string or `false`.
#[derive(Clone, Debug, Default)]
pub struct RequiredFields {
    names: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl FormValidator for RequiredFields {
    fn validate(&self, values: &FormValues) -> bool {
        self.names
            .iter()
            .all(|name| values.get(name).is_some_and(is_filled))
    }
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;
    fn field_keys() -> &'static [FieldKey];
}

pub fn values_from_model<T>(model: &T) -> FormResult<FormValues>
where
    T: Serialize,
{
    match serde_json::to_value(model) {
        Ok(Value::Object(entries)) => Ok(entries.into_iter().collect()),
        Ok(other) => Err(FormError::ModelConversion(format!(
            "expected an object, got {}",
            value_kind(&other)
        ))),
        Err(error) => Err(FormError::ModelConversion(error.to_string())),
    }
}

pub fn model_from_values<T>(values: &FormValues) -> FormResult<T>
where
    T: DeserializeOwned,
{
    let object = values
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect::<serde_json::Map<_, _>>();
    serde_json::from_value(Value::Object(object))
        .map_err(|error| FormError::ModelConversion(error.to_string()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
