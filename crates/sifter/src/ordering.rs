//! Order-by keys and their compiled comparators.
//!
//! [`compile_order`] turns a list of [`OrderKey`]s into an [`OrderChain`]:
//! the first key is the primary sort, each later key breaks ties left by
//! the ones before it. An empty key list compiles to `None`, meaning "no
//! explicit order", which is not the same as a stable order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::accessor::accessor;
use crate::error::{QueryError, Result};
use crate::hooks::Hooks;
use crate::property::Queryable;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a client's order-by list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderKey {
    pub path: String,
    #[serde(default)]
    pub descending: bool,
}

impl OrderKey {
    pub fn asc(path: impl Into<String>) -> Self {
        OrderKey {
            path: path.into(),
            descending: false,
        }
    }

    pub fn desc(path: impl Into<String>) -> Self {
        OrderKey {
            path: path.into(),
            descending: true,
        }
    }

    pub fn dir(&self) -> Dir {
        if self.descending {
            Dir::Desc
        } else {
            Dir::Asc
        }
    }
}

type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// One compiled sort key.
pub struct SortKey<T> {
    label: String,
    dir: Dir,
    compare: CompareFn<T>,
}

impl<T: 'static> SortKey<T> {
    /// Builds a key from an ascending comparator; `dir` is applied on top.
    pub fn new<F>(label: impl Into<String>, dir: Dir, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        SortKey {
            label: label.into(),
            dir,
            compare: Arc::new(compare),
        }
    }

    /// Builds a key that sorts by an extracted, totally ordered value.
    pub fn by_key<K, F>(label: impl Into<String>, dir: Dir, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        SortKey::new(label, dir, move |a: &T, b: &T| key(a).cmp(&key(b)))
    }
}

impl<T> SortKey<T> {
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.dir.apply((self.compare)(a, b))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        SortKey {
            label: self.label.clone(),
            dir: self.dir,
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortKey({} {})", self.label, self.dir)
    }
}

/// A primary sort key followed by tie-breakers.
pub struct OrderChain<T> {
    keys: Vec<SortKey<T>>,
}

impl<T> OrderChain<T> {
    /// Builds a chain from keys in priority order.
    pub fn new(keys: Vec<SortKey<T>>) -> Self {
        OrderChain { keys }
    }

    /// Compares two items key by key, returning the first non-equal result.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for key in &self.keys {
            let ordering = key.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub fn keys(&self) -> &[SortKey<T>] {
        &self.keys
    }

    /// The chain as order keys, for sources that sort out of process.
    pub fn description(&self) -> Vec<OrderKey> {
        self.keys
            .iter()
            .map(|key| OrderKey {
                path: key.label.clone(),
                descending: key.dir == Dir::Desc,
            })
            .collect()
    }
}

impl<T> Clone for OrderChain<T> {
    fn clone(&self) -> Self {
        OrderChain {
            keys: self.keys.clone(),
        }
    }
}

impl<T> fmt::Debug for OrderChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}

/// Compares two values of the same type.
///
/// Null sorts before any value and float NaN sorts before any other number.
/// Returns `None` if the types don't match.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => Some(a.sort_cmp(*b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),

        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),

        _ => None,
    }
}

/// Compiles order-by keys into a comparator chain.
///
/// Returns `Ok(None)` for an empty key list. The sort provider, if any, is
/// offered every key and told whether it is the primary one.
pub fn compile_order<T: Queryable>(
    keys: &[OrderKey],
    hooks: Hooks<'_, T>,
) -> Result<Option<OrderChain<T>>> {
    if keys.is_empty() {
        return Ok(None);
    }

    let mut chain = Vec::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        let primary = index == 0;
        if let Some(provider) = hooks.sort {
            if let Some(custom) = provider.sort_key(key, primary).map_err(QueryError::Hook)? {
                trace!(path = %key.path, primary, "order key compiled by sort provider");
                chain.push(custom);
                continue;
            }
        }
        chain.push(property_key(key)?);
    }

    debug!(keys = chain.len(), "compiled order");
    Ok(Some(OrderChain { keys: chain }))
}

fn property_key<T: Queryable>(key: &OrderKey) -> Result<SortKey<T>> {
    let accessor = accessor::<T>(&key.path)?;
    if accessor.is_collection() {
        return Err(QueryError::path(
            T::type_name(),
            &key.path,
            "cannot order by a collection",
        ));
    }

    Ok(SortKey::new(key.path.clone(), key.dir(), move |a: &T, b: &T| {
        match (accessor.read(a), accessor.read(b)) {
            // Type mismatch: treat as equal and fall through to the next key
            (Some(x), Some(y)) => compare_values(&x, &y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        }
    }))
}
