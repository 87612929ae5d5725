//! Derive macros for xdb
//!
//! Provides `#[derive(FromRow)]` and `#[derive(ToArgs)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod to_args;

/// Derive `FromRow` (and `RowSlot`) for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use xdb::FromRow;
///
/// #[derive(Default, FromRow)]
/// struct User {
///     #[xdb(col = "user_id")]
///     id: i64,
///     user_name: String,
///     #[xdb(embed)]
///     audit: Audit,
/// }
/// ```
///
/// # Attributes
///
/// - `#[xdb(col = "name")]` - Match this column name before name-based matching
/// - `#[xdb(embed)]` - Search the fields of this `FromRow` member as well
/// - `#[xdb(skip)]` - Never map into this field
#[proc_macro_derive(FromRow, attributes(xdb))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `ToArgs` (and `ArgSource`) for a struct with named fields.
///
/// Tokens resolve like columns do for `FromRow`: `col` tag, then field name ignoring case
/// and underscores, then embedded members.
///
/// # Example
///
/// ```ignore
/// use xdb::ToArgs;
///
/// #[derive(ToArgs)]
/// struct Filter {
///     min_age: i32,
///     #[xdb(col = "vip")]
///     is_vip: bool,
/// }
///
/// q.where_("age > ${min_age} AND vip = ${vip}");
/// q.reflect_args(&filter);
/// ```
#[proc_macro_derive(ToArgs, attributes(xdb))]
pub fn derive_to_args(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    to_args::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
