#[derive(elektra_form::form::FormModel)]
#[allow(dead_code)]
struct GenericForm<T> {
    value: T,
}

fn main() {}
