#[derive(elektra_form::form::FormModel)]
#[allow(dead_code)]
enum FormKind {
    Volume,
    Cluster,
}

fn main() {}
