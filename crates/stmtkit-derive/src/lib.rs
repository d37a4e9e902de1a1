//! Derive macros for stmtkit
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;

/// Derive the `Record` reflection trait for a struct.
///
/// # Example
///
/// ```ignore
/// use stmtkit::Record;
///
/// #[derive(serde::Serialize, Record)]
/// #[orm(rename_all = "PascalCase")]
/// struct Customer {
///     #[orm(key)]
///     id: i64,
///     name: String,
///     #[orm(column = "EmailAddress")]
///     email: Option<String>,
///     #[orm(skip)]
///     cached_label: String,
/// }
/// ```
///
/// # Attributes
///
/// Struct level:
/// - `#[orm(rename_all = "...")]` - Derive column names from field names
///   (`PascalCase`, `camelCase`, `snake_case`, `SCREAMING_SNAKE_CASE`, `kebab-case`)
///
/// Field level:
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(key)]` - Field is a key when binding with object-defined keys
/// - `#[orm(ignore_insert)]` - Never written by INSERT
/// - `#[orm(ignore_update)]` - Never written by UPDATE
/// - `#[orm(write_only)]` - Mapped, but never read from the object
/// - `#[orm(skip)]` - Not mapped to any column
///
/// Mapped readable fields must implement `serde::Serialize`.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
