//! Compiled predicates.
//!
//! A [`Predicate`] carries two views of the same condition: a closure that
//! evaluates it against an item in memory, and a serializable [`Filter`] tree
//! describing it, which lazy sources hand to whatever backend executes them.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::value::{ClauseValue, Value};

/// Ordering and equality operator of a [`Filter::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Evaluates a comparison given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }

    /// Evaluates `field <op> operand`.
    ///
    /// Equality is null-aware; ordering against null is always false.
    pub fn eval(self, field: &Value<'_>, operand: &ClauseValue) -> bool {
        match self {
            CompareOp::Eq => operand.equals(field),
            CompareOp::Ne => !operand.equals(field),
            _ => operand
                .compare(field)
                .is_some_and(|ordering| self.eval_ordering(ordering)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substring operator of a [`Filter::Text`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextOp {
    pub fn eval(self, field: &str, needle: &str) -> bool {
        match self {
            TextOp::Contains => field.contains(needle),
            TextOp::StartsWith => field.starts_with(needle),
            TextOp::EndsWith => field.ends_with(needle),
        }
    }
}

/// Backend-neutral description of a compiled predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Filter {
    Constant {
        value: bool,
    },
    Compare {
        path: String,
        op: CompareOp,
        value: ClauseValue,
    },
    Text {
        path: String,
        op: TextOp,
        value: String,
    },
    /// SQL-style pattern: `%` matches any run, `_` one character.
    Like {
        path: String,
        pattern: String,
    },
    In {
        path: String,
        values: Vec<ClauseValue>,
    },
    /// Some element of the collection at `path` satisfies `predicate`.
    Any {
        path: String,
        predicate: Box<Filter>,
    },
    Not {
        predicate: Box<Filter>,
    },
    And {
        left: Box<Filter>,
        right: Box<Filter>,
    },
    Or {
        left: Box<Filter>,
        right: Box<Filter>,
    },
    /// Produced by a custom predicate provider.
    Custom {
        name: String,
    },
}

type TestFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A compiled boolean condition over `T`.
pub struct Predicate<T> {
    filter: Filter,
    test: TestFn<T>,
}

impl<T: 'static> Predicate<T> {
    pub fn new<F>(filter: Filter, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Predicate {
            filter,
            test: Arc::new(test),
        }
    }

    /// A predicate that is always (or never) satisfied.
    pub fn constant(value: bool) -> Self {
        Predicate::new(Filter::Constant { value }, move |_| value)
    }

    /// A predicate built by application code, described as `Custom { name }`.
    pub fn custom<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Predicate::new(Filter::Custom { name: name.into() }, test)
    }

    pub fn and(self, other: Predicate<T>) -> Self {
        let (left, right) = (self.test, other.test);
        Predicate {
            filter: Filter::And {
                left: Box::new(self.filter),
                right: Box::new(other.filter),
            },
            test: Arc::new(move |item: &T| left(item) && right(item)),
        }
    }

    pub fn or(self, other: Predicate<T>) -> Self {
        let (left, right) = (self.test, other.test);
        Predicate {
            filter: Filter::Or {
                left: Box::new(self.filter),
                right: Box::new(other.filter),
            },
            test: Arc::new(move |item: &T| left(item) || right(item)),
        }
    }

    pub fn not(self) -> Self {
        let inner = self.test;
        Predicate {
            filter: Filter::Not {
                predicate: Box::new(self.filter),
            },
            test: Arc::new(move |item: &T| !inner(item)),
        }
    }
}

impl<T> Predicate<T> {
    /// Evaluates the predicate against one item.
    pub fn matches(&self, item: &T) -> bool {
        (self.test)(item)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate {
            filter: self.filter.clone(),
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.filter).finish()
    }
}

/// Compiles a `like` pattern into an anchored, case-sensitive regex.
///
/// `%` matches any run of characters, `_` exactly one, and `\` escapes the
/// character after it. Everything else matches literally.
pub(crate) fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("^(?s:");

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => source.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4]))),
                None => source.push_str(&regex::escape("\\")),
            },
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    source.push_str(")$");
    Regex::new(&source)
}
