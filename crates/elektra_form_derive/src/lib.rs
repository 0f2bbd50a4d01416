use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &model_ident,
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(
                &model_ident,
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let elektra = elektra_form_path();
    let mut fields_methods = Vec::new();
    let mut key_names = Vec::new();

    for field in named_fields {
        let key_name = match field_key_name(&field) {
            Ok(Some(name)) => name,
            Ok(None) => continue,
            Err(error) => return error.to_compile_error().into(),
        };
        let Some(field_ident) = field.ident else {
            continue;
        };

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #elektra::form::FieldKey {
                #elektra::form::FieldKey::new(#key_name)
            }
        });
        key_names.push(key_name);
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #elektra::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> &'static [#elektra::form::FieldKey] {
                const KEYS: &[#elektra::form::FieldKey] =
                    &[#(#elektra::form::FieldKey::new(#key_names)),*];
                KEYS
            }
        }
    }
    .into()
}

/// Reads `#[form(rename = "...")]` / `#[form(skip)]`; defaults to the field ident.
fn field_key_name(field: &Field) -> syn::Result<Option<String>> {
    let mut name = field.ident.as_ref().map(ToString::to_string);
    let mut skip = false;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("form")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `rename` or `skip`"))
            }
        })?;
    }

    Ok(if skip { None } else { name })
}

fn elektra_form_path() -> TokenStream2 {
    match crate_name("elektra_form") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::elektra_form),
    }
}
