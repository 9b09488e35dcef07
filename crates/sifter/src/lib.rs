//! Sifter - Compiles client query arguments into typed predicates and orderings.
//!
//! Clients send filter and sort arguments as plain data: a tree of where
//! clauses (`path`, `comparison`, `value`) and a list of order keys. Sifter
//! resolves each property path against a typed schema, validates the
//! operator for the property's type, converts the raw tokens, and produces:
//!
//! - a [`Predicate`] that evaluates in memory and also describes itself as a
//!   [`Filter`] tree for stores that translate queries
//! - an [`OrderChain`] of comparators, primary key first
//!
//! [`apply`] runs the whole argument pipeline (identity filter, where, order
//! by, skip, take) over a [`QuerySource`].
//!
//! # Quick Start
//!
//! ```rust
//! use sifter::{
//!     apply_to_slice, ArgumentOptions, ClauseNode, Comparison, Hooks, OrderKey, QueryArguments,
//!     Queryable,
//! };
//!
//! #[derive(Queryable)]
//! #[query(rename_all = "camelCase")]
//! struct Person {
//!     #[query(Scalar)]
//!     name: String,
//!     #[query(Scalar)]
//!     age: u32,
//! }
//!
//! let people = vec![
//!     Person { name: "Ann".into(), age: 30 },
//!     Person { name: "Bo".into(), age: 25 },
//!     Person { name: "Cy".into(), age: 41 },
//! ];
//!
//! let args = QueryArguments::new()
//!     .with_where(vec![ClauseNode::leaf(Person::AGE, Comparison::Between, ["20", "35"])])
//!     .order_by(OrderKey::desc(Person::AGE));
//!
//! let found = apply_to_slice(&people, &args, Hooks::new(), &ArgumentOptions::new()).unwrap();
//! let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
//! assert_eq!(names, ["Ann", "Bo"]);
//! ```
//!
//! # Combining Clauses
//!
//! Sibling clauses fold left to right. Each clause's `connector` says how it
//! joins the clause after it, so `[a (or), b (and), c]` is `(a || b) && c`.
//! A group node (`groupedExpressions`) acts as parentheses, and `negate`
//! inverts the whole combined result of a group. An empty clause list, at any
//! level, matches nothing.
//!
//! # Property Types and Operators
//!
//! | Family | Types | Operators |
//! |--------|-------|-----------|
//! | Text | `String` | `equal`, `notEqual`, `in`, `notIn`, `contains`, `startsWith`, `endsWith`, `like` |
//! | Ordered | integers, floats, timestamps, dates | `equal`, `notEqual`, `in`, `notIn`, `greaterThan(OrEqual)`, `lessThan(OrEqual)`, `between` |
//! | Equatable | `bool`, enums, uuids | `equal`, `notEqual`, `in`, `notIn` |
//!
//! List properties are addressed with brackets: `orders[total]` matches an
//! item if any element of `orders` satisfies the comparison on `total`.
//!
//! # Deterministic Paging
//!
//! `skip` and `take` require an order. Without an order key they are only
//! accepted over sources whose enumeration order is stable
//! ([`InMemory`]); over a [`LazyQuery`] they fail with
//! [`QueryError::Configuration`].

mod accessor;
mod clause;
mod comparison;
mod compile;
mod convert;
mod error;
mod hooks;
mod ordering;
mod path;
mod pipeline;
mod predicate;
mod property;
mod source;
mod value;

// Re-export public API
pub use accessor::{accessor, PropertyAccessor};
pub use clause::ClauseNode;
pub use comparison::{validate, validate_arity, validate_single, Arity, Comparison, Connector};
pub use compile::{compile_clause, compile_where, id_predicate};
pub use convert::{convert, convert_all};
pub use error::{BoxError, ClauseContext, QueryError, Result};
pub use hooks::{ClausePreprocessor, Hooks, PredicateProvider, SortProvider};
pub use ordering::{compare_values, compile_order, Dir, OrderChain, OrderKey, SortKey};
pub use path::PropertyPath;
pub use pipeline::{apply, apply_lazy, apply_to_slice, ArgumentOptions, QueryArguments};
pub use predicate::{CompareOp, Filter, Predicate, TextOp};
pub use property::{read_fn, FieldValue, Property, QueryEnum, Queryable, ReadFn};
pub use source::{InMemory, LazyQuery, QuerySource, QueryStep};
pub use value::{ClauseValue, EnumType, Number, Timestamp, TypeFamily, Value, ValueType};

#[cfg(feature = "derive")]
pub use sifter_macros::{QueryEnum, Queryable};
