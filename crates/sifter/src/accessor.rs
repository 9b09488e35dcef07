//! Path resolution and the process-wide accessor cache.
//!
//! Resolving `customer.address.city` against a type walks its
//! [`Queryable`] schema one segment at a time and composes the readers along
//! the way into a single [`PropertyAccessor`]. Resolved accessors are cached
//! per `(type, path)` and shared between threads.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::trace;

use crate::comparison::Comparison;
use crate::compile::build_leaf;
use crate::error::{QueryError, Result};
use crate::path::PropertyPath;
use crate::predicate::{Filter, Predicate};
use crate::property::{lookup, read_fn, PropertyKind, Queryable, ReadFn};
use crate::value::{Value, ValueType};

/// A resolved property path for `T`.
///
/// Either reads a single value out of an item, or (for bracketed paths)
/// tests the elements of a collection.
pub struct PropertyAccessor<T> {
    path: String,
    target: Target<T>,
}

pub(crate) enum Target<T> {
    Value {
        ty: ValueType,
        nullable: bool,
        read: ReadFn<T>,
    },
    Collection(Arc<dyn AnyMatch<T>>),
}

impl<T: Queryable> PropertyAccessor<T> {
    fn build(raw: &str) -> Result<Self> {
        let path =
            PropertyPath::parse(raw).map_err(|reason| QueryError::path(T::type_name(), raw, reason))?;
        let target = resolve::<T>(&path, 0)?;
        Ok(PropertyAccessor {
            path: raw.to_string(),
            target,
        })
    }
}

impl<T> PropertyAccessor<T> {
    /// The path this accessor was resolved from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Static type of the value read, or `None` for collections.
    pub fn value_type(&self) -> Option<ValueType> {
        match &self.target {
            Target::Value { ty, .. } => Some(*ty),
            Target::Collection(_) => None,
        }
    }

    /// Whether the value can be null, either declared optional or reached
    /// through an optional link.
    pub fn is_nullable(&self) -> bool {
        match &self.target {
            Target::Value { ty, nullable, .. } => *nullable || *ty == ValueType::Text,
            Target::Collection(_) => false,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.target, Target::Collection(_))
    }

    /// Reads the value out of `item`. Returns `None` for collection paths.
    pub fn read<'a>(&self, item: &'a T) -> Option<Value<'a>> {
        match &self.target {
            Target::Value { read, .. } => Some(read(item)),
            Target::Collection(_) => None,
        }
    }

    pub(crate) fn target(&self) -> &Target<T> {
        &self.target
    }
}

impl<T> std::fmt::Debug for PropertyAccessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("path", &self.path)
            .field("type", &self.value_type())
            .field("collection", &self.is_collection())
            .finish()
    }
}

type Erased = Arc<dyn Any + Send + Sync>;

static ACCESSORS: Lazy<RwLock<HashMap<TypeId, HashMap<String, Erased>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the accessor for `path` on `T`, resolving it on first use.
///
/// Failed resolutions are not cached. Concurrent first uses may both resolve
/// the path, but every caller gets the entry that was published first.
pub fn accessor<T: Queryable>(path: &str) -> Result<Arc<PropertyAccessor<T>>> {
    let type_id = TypeId::of::<T>();

    let cached = ACCESSORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .and_then(|paths| paths.get(path))
        .cloned();
    if let Some(hit) = cached {
        return downcast::<T>(hit, path);
    }

    trace!(type_name = T::type_name(), path, "resolving property accessor");
    let built: Erased = Arc::new(PropertyAccessor::<T>::build(path)?);

    let published = ACCESSORS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(type_id)
        .or_default()
        .entry(path.to_string())
        .or_insert(built)
        .clone();
    downcast::<T>(published, path)
}

fn downcast<T: Queryable>(erased: Erased, path: &str) -> Result<Arc<PropertyAccessor<T>>> {
    erased
        .downcast::<PropertyAccessor<T>>()
        .map_err(|_| QueryError::path(T::type_name(), path, "cached accessor has a foreign type"))
}

/// Resolves `path.segments()[index..]` against `T`.
fn resolve<T: Queryable>(path: &PropertyPath, index: usize) -> Result<Target<T>> {
    let fail = |reason: String| QueryError::path(T::type_name(), path.as_str(), reason);

    let Some(segment) = path.segments().get(index) else {
        return Err(fail("path ends before selecting a property".to_string()));
    };
    let property =
        lookup::<T>(segment).ok_or_else(|| fail(format!("no property named '{segment}'")))?;
    let last = index + 1 == path.segments().len();

    match property.kind {
        PropertyKind::Scalar { ty, nullable, read } => {
            if !last {
                Err(fail(format!("'{segment}' is a {ty} value and has no properties")))
            } else if path.is_collection() {
                Err(fail(format!("'{segment}' is not a collection")))
            } else {
                Ok(Target::Value { ty, nullable, read })
            }
        }
        PropertyKind::Nested(link) => {
            if !last {
                link.navigate(path, index + 1)
            } else if path.is_collection() {
                Err(fail(format!("'{segment}' is not a collection")))
            } else {
                Err(fail(format!(
                    "'{segment}' is an object; select one of its properties"
                )))
            }
        }
        PropertyKind::List(link) => {
            if last && path.is_collection() {
                link.navigate(path, index + 1)
            } else {
                Err(fail(format!(
                    "'{segment}' is a collection; address its elements as {segment}[property]"
                )))
            }
        }
    }
}

/// Continues resolution past an object or collection property.
pub(crate) trait Navigate<T>: Send + Sync {
    fn navigate(&self, path: &PropertyPath, next: usize) -> Result<Target<T>>;
}

/// Builds "some element matches" predicates over a collection of `T`.
pub(crate) trait AnyMatch<T>: Send + Sync {
    fn any_match(&self, comparison: Comparison, values: &[Option<String>])
        -> Result<Predicate<T>>;
}

pub(crate) struct NestedProperty<T, U, F> {
    pub(crate) get: Arc<F>,
    pub(crate) optional: bool,
    pub(crate) _marker: PhantomData<fn(&T) -> &U>,
}

impl<T, U, F> Navigate<T> for NestedProperty<T, U, F>
where
    T: Queryable,
    U: Queryable,
    F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
{
    fn navigate(&self, path: &PropertyPath, next: usize) -> Result<Target<T>> {
        let get = Arc::clone(&self.get);
        Ok(match resolve::<U>(path, next)? {
            Target::Value { ty, nullable, read } => Target::Value {
                ty,
                nullable: nullable || self.optional,
                read: read_fn(move |item: &T| match get(item) {
                    Some(inner) => read(inner),
                    None => Value::Null,
                }),
            },
            Target::Collection(inner) => Target::Collection(Arc::new(NestedAnyMatch {
                get,
                inner,
                _marker: PhantomData,
            })),
        })
    }
}

pub(crate) struct ListProperty<T, E, F> {
    pub(crate) get: Arc<F>,
    pub(crate) _marker: PhantomData<fn(&T) -> &E>,
}

impl<T, E, F> Navigate<T> for ListProperty<T, E, F>
where
    T: Queryable,
    E: Queryable,
    F: for<'a> Fn(&'a T) -> &'a [E] + Send + Sync + 'static,
{
    fn navigate(&self, path: &PropertyPath, _next: usize) -> Result<Target<T>> {
        let Some(element) = path.element() else {
            return Err(QueryError::path(
                T::type_name(),
                path.as_str(),
                "collection path has no element selector",
            ));
        };
        let element = accessor::<E>(element)?;
        Ok(Target::Collection(Arc::new(ListAnyMatch {
            path: path.segments().join("."),
            get: Arc::clone(&self.get),
            element,
            _marker: PhantomData,
        })))
    }
}

struct ListAnyMatch<T, E, F> {
    path: String,
    get: Arc<F>,
    element: Arc<PropertyAccessor<E>>,
    _marker: PhantomData<fn(&T)>,
}

impl<T, E, F> AnyMatch<T> for ListAnyMatch<T, E, F>
where
    T: Queryable,
    E: Queryable,
    F: for<'a> Fn(&'a T) -> &'a [E] + Send + Sync + 'static,
{
    fn any_match(
        &self,
        comparison: Comparison,
        values: &[Option<String>],
    ) -> Result<Predicate<T>> {
        let inner = build_leaf(&self.element, comparison, values)?;
        let filter = Filter::Any {
            path: self.path.clone(),
            predicate: Box::new(inner.filter().clone()),
        };
        let get = Arc::clone(&self.get);
        Ok(Predicate::new(filter, move |item: &T| {
            get(item).iter().any(|element| inner.matches(element))
        }))
    }
}

struct NestedAnyMatch<T, U, F> {
    get: Arc<F>,
    inner: Arc<dyn AnyMatch<U>>,
    _marker: PhantomData<fn(&T) -> &U>,
}

impl<T, U, F> AnyMatch<T> for NestedAnyMatch<T, U, F>
where
    T: Queryable,
    U: Queryable,
    F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
{
    fn any_match(
        &self,
        comparison: Comparison,
        values: &[Option<String>],
    ) -> Result<Predicate<T>> {
        let inner = self.inner.any_match(comparison, values)?;
        let get = Arc::clone(&self.get);
        Ok(Predicate::new(inner.filter().clone(), move |item: &T| {
            get(item).is_some_and(|linked| inner.matches(linked))
        }))
    }
}
