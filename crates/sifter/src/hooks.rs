//! Extension points for compiling where and order-by arguments.
//!
//! Hooks are passed explicitly to each compile call through [`Hooks`]; there
//! is no global registry. Plain closures implement every hook trait:
//!
//! ```
//! use sifter::{BoxError, ClauseNode, Hooks, Predicate};
//!
//! struct Doc { owner: u32 }
//!
//! let scope = |node: &ClauseNode| -> Result<Option<Predicate<Doc>>, BoxError> {
//!     if node.path == "mine" {
//!         return Ok(Some(Predicate::custom("mine", |d: &Doc| d.owner == 7)));
//!     }
//!     Ok(None)
//! };
//! let hooks = Hooks::<Doc>::new().with_predicate_provider(&scope);
//! # let _ = hooks;
//! ```

use crate::clause::ClauseNode;
use crate::error::BoxError;
use crate::ordering::{OrderKey, SortKey};
use crate::predicate::Predicate;

/// Supplies a predicate for a clause node in place of the built-in one.
pub trait PredicateProvider<T> {
    /// Returns `Some` to override compilation of `node`.
    fn predicate(&self, node: &ClauseNode) -> Result<Option<Predicate<T>>, BoxError>;
}

/// Rewrites clause nodes before they are compiled.
pub trait ClausePreprocessor {
    fn preprocess(&self, node: &mut ClauseNode) -> Result<(), BoxError>;
}

/// Supplies a sort key for an order-by entry in place of the built-in one.
pub trait SortProvider<T> {
    /// `primary` is `true` for the first key of the order chain.
    fn sort_key(&self, key: &OrderKey, primary: bool) -> Result<Option<SortKey<T>>, BoxError>;
}

impl<T, F> PredicateProvider<T> for F
where
    F: Fn(&ClauseNode) -> Result<Option<Predicate<T>>, BoxError>,
{
    fn predicate(&self, node: &ClauseNode) -> Result<Option<Predicate<T>>, BoxError> {
        self(node)
    }
}

impl<F> ClausePreprocessor for F
where
    F: Fn(&mut ClauseNode) -> Result<(), BoxError>,
{
    fn preprocess(&self, node: &mut ClauseNode) -> Result<(), BoxError> {
        self(node)
    }
}

impl<T, F> SortProvider<T> for F
where
    F: Fn(&OrderKey, bool) -> Result<Option<SortKey<T>>, BoxError>,
{
    fn sort_key(&self, key: &OrderKey, primary: bool) -> Result<Option<SortKey<T>>, BoxError> {
        self(key, primary)
    }
}

/// The hooks in effect for one compile call.
pub struct Hooks<'h, T> {
    pub predicate: Option<&'h dyn PredicateProvider<T>>,
    pub preprocessor: Option<&'h dyn ClausePreprocessor>,
    pub sort: Option<&'h dyn SortProvider<T>>,
}

impl<'h, T> Hooks<'h, T> {
    /// No hooks.
    pub fn new() -> Self {
        Hooks {
            predicate: None,
            preprocessor: None,
            sort: None,
        }
    }

    pub fn with_predicate_provider(mut self, provider: &'h dyn PredicateProvider<T>) -> Self {
        self.predicate = Some(provider);
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: &'h dyn ClausePreprocessor) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn with_sort_provider(mut self, provider: &'h dyn SortProvider<T>) -> Self {
        self.sort = Some(provider);
        self
    }
}

impl<T> Default for Hooks<'_, T> {
    fn default() -> Self {
        Hooks::new()
    }
}

impl<T> Clone for Hooks<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Hooks<'_, T> {}
