//! Applies client query arguments to a source.
//!
//! The steps run in a fixed order, each only if its argument is present:
//! identity filter, where, order by, skip, take. Skip and take are refused
//! unless the result has a deterministic order.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clause::ClauseNode;
use crate::compile::{compile_where, id_predicate};
use crate::error::{QueryError, Result};
use crate::hooks::Hooks;
use crate::ordering::{compile_order, OrderKey};
use crate::property::Queryable;
use crate::source::{InMemory, LazyQuery, QuerySource};

/// Raw client arguments for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryArguments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Vec<ClauseNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<usize>,
}

impl QueryArguments {
    pub fn new() -> Self {
        QueryArguments::default()
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_where(mut self, nodes: Vec<ClauseNode>) -> Self {
        self.where_clause = Some(nodes);
        self
    }

    pub fn order_by(mut self, key: OrderKey) -> Self {
        self.order_by.push(key);
        self
    }

    pub fn skip(mut self, count: usize) -> Self {
        self.skip = Some(count);
        self
    }

    pub fn take(mut self, count: usize) -> Self {
        self.take = Some(count);
        self
    }
}

/// How [`apply`] treats a set of arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArgumentOptions {
    /// Key property for the identity filter. Empty disables it.
    pub key_names: Vec<String>,
    /// When false, order by, skip and take are not applied.
    pub apply_order: bool,
    /// Skip argument processing entirely.
    pub omit: bool,
}

impl Default for ArgumentOptions {
    fn default() -> Self {
        ArgumentOptions {
            key_names: Vec::new(),
            apply_order: true,
            omit: false,
        }
    }
}

impl ArgumentOptions {
    pub fn new() -> Self {
        ArgumentOptions::default()
    }

    pub fn with_key(mut self, name: impl Into<String>) -> Self {
        self.key_names.push(name.into());
        self
    }

    pub fn with_apply_order(mut self, apply: bool) -> Self {
        self.apply_order = apply;
        self
    }

    pub fn with_omit(mut self, omit: bool) -> Self {
        self.omit = omit;
        self
    }
}

/// Applies `args` to `source`.
///
/// # Errors
///
/// Any compilation error aborts the whole call. Skip or take without an
/// order by, over a source whose order is not stable, is a
/// [`QueryError::Configuration`].
pub fn apply<T, S>(
    source: S,
    args: &QueryArguments,
    hooks: Hooks<'_, T>,
    options: &ArgumentOptions,
) -> Result<S>
where
    T: Queryable,
    S: QuerySource<T>,
{
    if options.omit {
        debug!(type_name = T::type_name(), "query arguments omitted");
        return Ok(source);
    }

    let stable = source.has_stable_order();
    let mut source = source;

    if let Some(ids) = &args.ids {
        match options.key_names.as_slice() {
            [] => debug!("ids supplied but no key property is configured"),
            [key] => {
                debug!(key = %key, count = ids.len(), "applying identity filter");
                source = source.filter(&id_predicate::<T>(key, ids)?);
            }
            keys => {
                return Err(QueryError::configuration(
                    "ids",
                    format!(
                        "composite keys are not supported, but {} key names are configured",
                        keys.len()
                    ),
                ))
            }
        }
    }

    if let Some(nodes) = &args.where_clause {
        debug!(clauses = nodes.len(), "applying where");
        source = source.filter(&compile_where(nodes, hooks)?);
    }

    if !options.apply_order {
        return Ok(source);
    }

    let order = compile_order(&args.order_by, hooks)?;
    let ordered = order.is_some();
    if let Some(chain) = &order {
        debug!(keys = chain.keys().len(), "applying order by");
        source = source.order(chain);
    }

    if let Some(count) = args.skip {
        ensure_deterministic("skip", ordered, stable)?;
        source = source.skip(count);
    }
    if let Some(count) = args.take {
        ensure_deterministic("take", ordered, stable)?;
        source = source.take(count);
    }

    Ok(source)
}

fn ensure_deterministic(operation: &'static str, ordered: bool, stable: bool) -> Result<()> {
    if ordered || stable {
        return Ok(());
    }
    warn!(operation, "refusing to page a source without an order");
    Err(QueryError::configuration(
        operation,
        "the source has no stable order; supply an order_by",
    ))
}

/// Applies `args` to a materialized slice.
pub fn apply_to_slice<'a, T: Queryable>(
    items: &'a [T],
    args: &QueryArguments,
    hooks: Hooks<'_, T>,
    options: &ArgumentOptions,
) -> Result<Vec<&'a T>> {
    apply(InMemory::new(items), args, hooks, options).map(InMemory::into_vec)
}

/// Records `args` as deferred steps for a store to execute.
pub fn apply_lazy<T: Queryable>(
    args: &QueryArguments,
    hooks: Hooks<'_, T>,
    options: &ArgumentOptions,
) -> Result<LazyQuery<T>> {
    apply(LazyQuery::new(), args, hooks, options)
}
