//! Derive macros for Sifter.
//!
//! - [`Queryable`] - Generate the query schema of a struct
//! - [`QueryEnum`] - Expose a unit-only enum to queries by variant name
//!
//! The generated code refers to `::sifter`, so these macros are meant to be
//! used through the re-exports in the `sifter` crate.

mod query_enum;
mod queryable;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `sifter::Queryable` for a struct with named fields.
///
/// Fields are opt-in: only fields carrying a kind are queryable.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `Scalar` | A value implementing `FieldValue` (text, numbers, bool, dates, uuids, and `Option`s of them) |
/// | `Enum` | An enum implementing `QueryEnum`, or an `Option` of one |
/// | `Nested` | An embedded `Queryable` struct, or an `Option` of one; paths continue with `.` |
/// | `List` | A `Vec` (or anything indexable by `..`) of `Queryable` elements; addressed as `field[property]` |
/// | `skip` | Exclude this field from queries |
/// | `rename = "..."` | Use a custom name for queries |
///
/// On the struct, `#[query(rename_all = "camelCase")]` renames every field
/// (`camelCase`, `PascalCase`, `snake_case`, `lowercase`).
///
/// # Generated Code
///
/// 1. Query name constants (e.g., `Person::NAME`, `Person::CREATED_AT`)
/// 2. An implementation of `Queryable` listing the fields in `FIELDS`
///
/// # Example
///
/// ```ignore
/// use sifter::{compile_where, ClauseNode, Comparison, Hooks, QueryEnum, Queryable};
///
/// #[derive(QueryEnum)]
/// enum Role { Admin, Member }
///
/// #[derive(Queryable)]
/// struct Address {
///     #[query(Scalar)]
///     city: String,
/// }
///
/// #[derive(Queryable)]
/// #[query(rename_all = "camelCase")]
/// struct Person {
///     #[query(Scalar)]
///     display_name: String,
///     #[query(Enum)]
///     role: Role,
///     #[query(Nested)]
///     address: Option<Address>,
///     #[query(skip)]
///     password_hash: String,
/// }
///
/// let filter = compile_where::<Person>(
///     &[ClauseNode::leaf("address.city", Comparison::Equal, ["Lisbon"])],
///     Hooks::new(),
/// )?;
/// ```
#[proc_macro_derive(Queryable, attributes(query))]
pub fn queryable_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    queryable::queryable_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `sifter::QueryEnum` for a unit-only enum.
///
/// Variants are matched by name (case-insensitively) or by discriminant.
/// Discriminants are the variant's explicit integer value or its position
/// counted from the previous one. `#[query(rename = "...")]` on a variant
/// and `#[query(rename_all = "...")]` on the enum change the names.
///
/// ```ignore
/// use sifter::QueryEnum;
///
/// #[derive(QueryEnum)]
/// #[query(rename_all = "snake_case")]
/// enum Status {
///     Open,
///     InProgress,
///     Closed = 10,
/// }
///
/// assert_eq!(Status::VARIANTS, &[("open", 0), ("in_progress", 1), ("closed", 10)]);
/// ```
#[proc_macro_derive(QueryEnum, attributes(query))]
pub fn query_enum_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    query_enum::query_enum_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
