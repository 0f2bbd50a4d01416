#[derive(elektra_form::form::FormModel)]
#[allow(dead_code)]
struct TupleForm(String, u32);

fn main() {}
