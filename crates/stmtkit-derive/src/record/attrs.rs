//! Attribute parsing for the Record derive macro.
//!
//! Handles parsing of struct-level and field-level `#[orm(...)]` attributes.

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use syn::ext::IdentExt;
use syn::{DeriveInput, Result};

/// Column naming convention from `#[orm(rename_all = "...")]`.
#[derive(Clone, Copy)]
pub(super) enum RenameRule {
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
}

impl RenameRule {
    fn from_lit(lit: &syn::LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            "kebab-case" => Ok(Self::Kebab),
            other => Err(syn::Error::new_spanned(
                lit,
                format!("unknown rename_all rule \"{other}\""),
            )),
        }
    }

    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Pascal => name.to_pascal_case(),
            Self::Camel => name.to_lower_camel_case(),
            Self::Snake => name.to_snake_case(),
            Self::ScreamingSnake => name.to_shouty_snake_case(),
            Self::Kebab => name.to_kebab_case(),
        }
    }
}

/// Struct-level attributes.
#[derive(Default)]
pub(super) struct StructAttr {
    pub rename_all: Option<RenameRule>,
}

/// Parse struct-level `#[orm(...)]` attributes.
pub(super) fn get_struct_attr(input: &DeriveInput) -> Result<StructAttr> {
    let mut out = StructAttr::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                out.rename_all = Some(RenameRule::from_lit(&lit)?);
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute; expected `rename_all`"))
            }
        })?;
    }
    Ok(out)
}

/// Field-level attributes.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub column: Option<String>,
    pub is_key: bool,
    pub ignore_insert: bool,
    pub ignore_update: bool,
    pub write_only: bool,
    pub skip: bool,
}

/// Parse field-level `#[orm(...)]` attributes.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Err(meta.error("expected an identifier"));
            };
            match ident.to_string().as_str() {
                "column" => {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    out.column = Some(lit.value());
                }
                "key" => out.is_key = true,
                "ignore_insert" => out.ignore_insert = true,
                "ignore_update" => out.ignore_update = true,
                "write_only" => out.write_only = true,
                "skip" => out.skip = true,
                _ => {
                    return Err(meta.error(
                        "unsupported field attribute; expected one of `column`, `key`, \
                         `ignore_insert`, `ignore_update`, `write_only`, `skip`",
                    ));
                }
            }
            Ok(())
        })?;
    }

    if out.skip && (out.column.is_some() || out.is_key) {
        return Err(syn::Error::new_spanned(
            field,
            "#[orm(skip)] cannot be combined with `column` or `key`",
        ));
    }
    Ok(out)
}

/// Host property name of a field (raw identifiers lose their `r#`).
pub(super) fn property_name(field: &syn::Field) -> Result<String> {
    field
        .ident
        .as_ref()
        .map(|ident| ident.unraw().to_string())
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
}
