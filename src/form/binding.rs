use serde_json::Value;

use crate::error_tree::Scalar;

use super::controller::{FormController, FormResult, read_lock};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldKind {
    Text,
    Password,
    Email,
    Number,
    Textarea,
    Select,
    Checkbox,
    Switch,
}

impl FieldKind {
    pub fn is_toggle(self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Switch)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldEvent {
    pub value: String,
    pub checked: bool,
}

impl FieldEvent {
    pub fn input(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            checked: false,
        }
    }

    pub fn toggled(checked: bool) -> Self {
        Self {
            value: if checked { "on".into() } else { String::new() },
            checked,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DisplayValue {
    Text(String),
    Toggle(bool),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldDecoration {
    pub required: bool,
    pub invalid: bool,
}

impl FieldDecoration {
    pub fn class_names(self) -> Vec<&'static str> {
        let mut classes = vec![if self.required { "required" } else { "optional" }];
        if self.invalid {
            classes.push("has-error");
        }
        classes
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldBinding {
    id: String,
    name: String,
    kind: FieldKind,
    required: bool,
}

impl FieldBinding {
    pub fn new(
        group_id: Option<&str>,
        name: impl Into<String>,
        explicit_id: Option<&str>,
        kind: FieldKind,
    ) -> Self {
        let name = name.into();
        let id = match (explicit_id, group_id) {
            (Some(id), _) => id.to_owned(),
            (None, Some(group)) => format!("{group}_{name}"),
            (None, None) => name.clone(),
        };
        Self {
            id,
            name,
            kind,
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Toggles show "on" only for a stored `true`; anything else is "off".
    pub fn display_value(&self, controller: &FormController) -> FormResult<DisplayValue> {
        let state = read_lock(&controller.state, "reading field display value")?;
        let stored = state.values.get(&self.name);
        Ok(if self.kind.is_toggle() {
            DisplayValue::Toggle(matches!(stored, Some(Value::Bool(true))))
        } else {
            DisplayValue::Text(stored.map(display_text).unwrap_or_default())
        })
    }

    pub fn normalize(&self, event: &FieldEvent) -> Value {
        if self.kind.is_toggle() {
            Value::Bool(event.checked)
        } else {
            Value::String(event.value.clone())
        }
    }

    pub fn handle(&self, controller: &FormController, event: &FieldEvent) -> FormResult<()> {
        controller.update_value(self.name.clone(), self.normalize(event))
    }

    pub fn decoration(&self, controller: &FormController) -> FormResult<FieldDecoration> {
        Ok(FieldDecoration {
            required: self.required,
            invalid: controller.is_field_invalid(&self.name)?,
        })
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => Scalar::Number(number.clone()).to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
