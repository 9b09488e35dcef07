//! Implementation of the `#[derive(Queryable)]` macro.
//!
//! Generates the `Queryable` schema of a struct and field name constants
//! for typed path building.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument,
    PathArguments, Result, Type,
};

use super::attrs::{parse_query_attrs, QueryKind};

/// Main implementation of the Queryable derive macro.
pub fn queryable_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Queryable cannot be derived for generic structs; implement it by hand",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Queryable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Queryable can only be derived for structs",
            ))
        }
    };

    let container = parse_query_attrs(&input.attrs)?;

    let mut names: Vec<String> = Vec::new();
    let mut property_arms: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_query_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let kind = match attrs.kind {
            Some(k) => k,
            None => continue,
        };

        let base_name = field_name.unraw().to_string();
        let query_name = match (attrs.rename, container.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply(&base_name),
            (None, None) => base_name,
        };

        if names.iter().any(|n| n.eq_ignore_ascii_case(&query_name)) {
            return Err(Error::new(
                field.span(),
                format!("duplicate query name '{}'", query_name),
            ));
        }

        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));
        field_constants.push(quote! {
            /// Query name constant for typed paths.
            pub const #const_name: &'static str = #query_name;
        });

        let optional = option_inner(&field.ty).is_some();
        let property = match kind {
            QueryKind::Scalar => quote! {
                ::sifter::Property::scalar(|item: &Self| &item.#field_name)
            },
            QueryKind::Enum if optional => quote! {
                ::sifter::Property::optional_enumeration(|item: &Self| item.#field_name.as_ref())
            },
            QueryKind::Enum => quote! {
                ::sifter::Property::enumeration(|item: &Self| &item.#field_name)
            },
            QueryKind::Nested if optional => quote! {
                ::sifter::Property::optional_nested(|item: &Self| item.#field_name.as_ref())
            },
            QueryKind::Nested => quote! {
                ::sifter::Property::nested(|item: &Self| &item.#field_name)
            },
            QueryKind::List => quote! {
                ::sifter::Property::list(|item: &Self| &item.#field_name[..])
            },
        };

        property_arms.push(quote! {
            #query_name => ::core::option::Option::Some(#property),
        });
        names.push(query_name);
    }

    let type_name = struct_name.unraw().to_string();

    let expanded = quote! {
        impl #struct_name {
            #(#field_constants)*
        }

        impl ::sifter::Queryable for #struct_name {
            const FIELDS: &'static [&'static str] = &[#(#names),*];

            fn property(name: &str) -> ::core::option::Option<::sifter::Property<Self>> {
                match name {
                    #(#property_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn type_name() -> &'static str {
                #type_name
            }
        }
    };

    Ok(expanded)
}

/// Returns `T` if `ty` is written as `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
pub(crate) fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
