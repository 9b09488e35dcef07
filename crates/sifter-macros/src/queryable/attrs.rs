//! Attribute parsing for the Queryable and QueryEnum derive macros.
//!
//! Fields opt in with `#[query(...)]`; containers may carry
//! `#[query(rename_all = "...")]`.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Ident, Lit, LitStr, Meta, Result, Token,
};

/// How a field is exposed to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A value implementing `FieldValue`: `#[query(Scalar)]`
    Scalar,
    /// An enum implementing `QueryEnum`: `#[query(Enum)]`
    Enum,
    /// An embedded `Queryable` object: `#[query(Nested)]`
    Nested,
    /// A slice-like collection of `Queryable` elements: `#[query(List)]`
    List,
}

impl QueryKind {
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        match ident.to_string().as_str() {
            "Scalar" | "scalar" => Ok(QueryKind::Scalar),
            "Enum" | "enumeration" => Ok(QueryKind::Enum),
            "Nested" | "nested" => Ok(QueryKind::Nested),
            "List" | "list" => Ok(QueryKind::List),
            other => Err(Error::new(
                ident.span(),
                format!(
                    "unknown query kind: '{}'. Expected one of: Scalar, Enum, Nested, List",
                    other
                ),
            )),
        }
    }
}

/// Case convention applied to every field or variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    CamelCase,
    PascalCase,
    SnakeCase,
    Lowercase,
}

impl RenameRule {
    fn from_lit(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "camelCase" => Ok(RenameRule::CamelCase),
            "PascalCase" => Ok(RenameRule::PascalCase),
            "snake_case" => Ok(RenameRule::SnakeCase),
            "lowercase" => Ok(RenameRule::Lowercase),
            other => Err(Error::new(
                lit.span(),
                format!(
                    "unknown rename_all rule: '{}'. Expected one of: camelCase, PascalCase, snake_case, lowercase",
                    other
                ),
            )),
        }
    }

    /// Applies the rule to a Rust identifier (snake_case field or PascalCase variant).
    pub fn apply(self, name: &str) -> String {
        let words = split_words(name);
        match self {
            RenameRule::CamelCase => {
                let mut out = String::with_capacity(name.len());
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            RenameRule::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
            RenameRule::SnakeCase => words
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join("_"),
            RenameRule::Lowercase => words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in name.trim_start_matches("r#").chars() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Field and variant attributes from `#[query(...)]`.
#[derive(Debug, Clone)]
pub struct QueryAttr {
    pub kind: Option<QueryKind>,
    pub skip: bool,
    pub rename: Option<String>,
    pub rename_all: Option<RenameRule>,
    pub span: Span,
}

impl Default for QueryAttr {
    fn default() -> Self {
        QueryAttr {
            kind: None,
            skip: false,
            rename: None,
            rename_all: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for QueryAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = QueryAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        attr.kind = Some(QueryKind::from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "expected query kind: Scalar, Enum, Nested, List, or skip",
                        ));
                    }
                }

                Meta::NameValue(nv) => {
                    let lit = string_lit(&nv.value)?;
                    if nv.path.is_ident("rename") {
                        attr.rename = Some(lit.value());
                    } else if nv.path.is_ident("rename_all") {
                        attr.rename_all = Some(RenameRule::from_lit(lit)?);
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or rename_all",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown query attribute. Expected: Scalar, Enum, Nested, List, skip, rename = \"...\", or rename_all = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

fn string_lit(expr: &Expr) -> Result<&LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s),
        other => Err(Error::new(other.span(), "expected a string literal")),
    }
}

/// Extract `#[query(...)]` attributes.
pub fn parse_query_attrs(attrs: &[Attribute]) -> Result<QueryAttr> {
    for attr in attrs {
        if attr.path().is_ident("query") {
            return attr.parse_args::<QueryAttr>();
        }
    }
    Ok(QueryAttr::default())
}
