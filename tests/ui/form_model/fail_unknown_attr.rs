#[derive(elektra_form::form::FormModel)]
#[allow(dead_code)]
struct VolumeForm {
    #[form(default)]
    name: String,
}

fn main() {}
