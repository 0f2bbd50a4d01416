use elektra_form::form::{FormController, FormModel, FormOptions};

#[derive(Clone, elektra_form::form::FormModel)]
struct ClusterForm {
    name: String,
    #[form(rename = "node_count")]
    nodes: u32,
    #[form(skip)]
    draft_note: String,
}

fn main() {
    let fields = ClusterForm::fields();
    assert_eq!(fields.name().as_str(), "name");
    assert_eq!(fields.nodes().as_str(), "node_count");
    assert_eq!(ClusterForm::field_keys().len(), 2);

    let controller = FormController::new(FormOptions::default());
    controller
        .update_value(fields.nodes(), 3)
        .expect("update through a derived key");
    assert!(!controller.is_field_invalid(fields.name()).expect("lookup"));

    let form = ClusterForm {
        name: String::new(),
        nodes: 0,
        draft_note: String::new(),
    };
    let _ = (form.name, form.nodes, form.draft_note);
}
