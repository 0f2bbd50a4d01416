use super::binding::{FieldBinding, FieldDecoration};
use super::controller::{FormController, FormResult};

const GRID_COLUMNS: u8 = 12;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FieldGroupLayout {
    #[default]
    Stacked,
    Horizontal { label_span: u8, content_span: u8 },
    Inline,
}

impl FieldGroupLayout {
    pub fn horizontal(label_span: u8) -> Self {
        let label_span = label_span.clamp(1, GRID_COLUMNS - 1);
        FieldGroupLayout::Horizontal {
            label_span,
            content_span: GRID_COLUMNS - label_span,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldGroup {
    binding: FieldBinding,
    label: String,
    layout: FieldGroupLayout,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldGroupView {
    pub label_for: String,
    pub label: String,
    pub required_marker: bool,
    pub decoration: FieldDecoration,
    pub layout: FieldGroupLayout,
    /// `None` for inline groups, which render without a wrapping container.
    pub wrapper_classes: Option<Vec<&'static str>>,
}

impl FieldGroup {
    pub fn new(binding: FieldBinding, label: impl Into<String>) -> Self {
        Self {
            binding,
            label: label.into(),
            layout: FieldGroupLayout::default(),
        }
    }

    pub fn layout(mut self, layout: FieldGroupLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn horizontal(self) -> Self {
        self.layout(FieldGroupLayout::horizontal(4))
    }

    pub fn inline(self) -> Self {
        self.layout(FieldGroupLayout::Inline)
    }

    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    pub fn view(&self, controller: &FormController) -> FormResult<FieldGroupView> {
        let decoration = self.binding.decoration(controller)?;
        let wrapper_classes = match self.layout {
            FieldGroupLayout::Inline => None,
            FieldGroupLayout::Stacked | FieldGroupLayout::Horizontal { .. } => {
                let mut classes = vec!["form-group"];
                classes.extend(decoration.class_names());
                Some(classes)
            }
        };
        Ok(FieldGroupView {
            label_for: self.binding.id().to_owned(),
            label: self.label.clone(),
            required_marker: decoration.required,
            decoration,
            layout: self.layout,
            wrapper_classes,
        })
    }
}
