//! Implementation of the `#[derive(Queryable)]` macro.
//!
//! Field annotations select how each field is exposed; the generated
//! `Queryable` impl is what the path resolver walks.

mod attrs;
mod derive;

pub use attrs::parse_query_attrs;
pub use derive::queryable_derive_impl;
