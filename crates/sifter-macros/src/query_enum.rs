//! Implementation of the `#[derive(QueryEnum)]` macro.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    ext::IdentExt, spanned::Spanned, Data, DeriveInput, Error, Expr, ExprLit, Fields, Lit, Result,
};

use crate::queryable::parse_query_attrs;

/// Main implementation of the QueryEnum derive macro.
///
/// Discriminants follow Rust's rules: explicit integer literals are used as
/// written, other variants count up from the previous one.
pub fn query_enum_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let enum_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "QueryEnum cannot be derived for generic enums",
        ));
    }

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(Error::new(
                input.span(),
                "QueryEnum can only be derived for enums",
            ))
        }
    };

    let container = parse_query_attrs(&input.attrs)?;

    let mut entries: Vec<TokenStream> = Vec::new();
    let mut arms: Vec<TokenStream> = Vec::new();
    let mut next: Option<u32> = Some(0);

    for variant in variants.iter() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new(
                variant.span(),
                "QueryEnum variants cannot carry data",
            ));
        }

        let discriminant = match &variant.discriminant {
            Some((_, Expr::Lit(ExprLit {
                lit: Lit::Int(int), ..
            }))) => int.base10_parse::<u32>()?,
            Some((_, expr)) => {
                return Err(Error::new(
                    expr.span(),
                    "QueryEnum discriminants must be integer literals",
                ))
            }
            None => next.ok_or_else(|| {
                Error::new(
                    variant.ident.span(),
                    "QueryEnum discriminant overflows u32",
                )
            })?,
        };
        next = discriminant.checked_add(1);

        let attrs = parse_query_attrs(&variant.attrs)?;
        let ident = &variant.ident;
        let base_name = ident.unraw().to_string();
        let query_name = match (attrs.rename, container.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply(&base_name),
            (None, None) => base_name,
        };

        entries.push(quote! { (#query_name, #discriminant) });
        arms.push(quote! { #enum_name::#ident => #discriminant, });
    }

    let discriminant_body = if arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#arms)*
            }
        }
    };

    let expanded = quote! {
        impl ::sifter::QueryEnum for #enum_name {
            const VARIANTS: &'static [(&'static str, u32)] = &[#(#entries),*];

            fn discriminant(&self) -> u32 {
                #discriminant_body
            }
        }
    };

    Ok(expanded)
}
