//! Record derive macro implementation

mod attrs;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let struct_attr = attrs::get_struct_attr(&input)?;

    let mut infos = Vec::with_capacity(fields.len());
    let mut getters = Vec::new();
    for field in fields {
        let attr = attrs::get_field_attr(field)?;
        let prop = attrs::property_name(field)?;

        if attr.skip {
            infos.push(quote! { ::stmtkit::PropertyInfo::unmapped(#prop) });
            continue;
        }

        let column = match (&attr.column, struct_attr.rename_all) {
            (Some(column), _) => column.clone(),
            (None, Some(rule)) => rule.apply(&prop),
            (None, None) => prop.clone(),
        };

        let mut info = quote! { ::stmtkit::PropertyInfo::new(#prop, #column) };
        if attr.is_key {
            info = quote! { #info.key() };
        }
        if attr.ignore_insert {
            info = quote! { #info.ignore_on_insert() };
        }
        if attr.ignore_update {
            info = quote! { #info.ignore_on_update() };
        }
        if attr.write_only {
            info = quote! { #info.write_only() };
        }
        infos.push(info);

        if !attr.write_only {
            let ident = field.ident.as_ref();
            getters.push(quote! {
                #prop => ::stmtkit::serde_json::to_value(&self.#ident)
                    .map(::core::option::Option::Some)
                    .map_err(|e| ::stmtkit::StmtError::serialization(#prop, e.to_string())),
            });
        }
    }

    Ok(quote! {
        impl #impl_generics ::stmtkit::Record for #name #ty_generics #where_clause {
            fn properties() -> &'static [::stmtkit::PropertyInfo] {
                const PROPERTIES: &[::stmtkit::PropertyInfo] = &[#(#infos),*];
                PROPERTIES
            }

            fn property_value(
                &self,
                name: &str,
            ) -> ::stmtkit::StmtResult<::core::option::Option<::stmtkit::serde_json::Value>> {
                match name {
                    #(#getters)*
                    _ => ::core::result::Result::Ok(::core::option::Option::None),
                }
            }
        }
    })
}
