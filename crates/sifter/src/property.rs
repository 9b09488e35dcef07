//! Schema traits for query-enabled types.
//!
//! A type takes part in queries by implementing [`Queryable`], which maps a
//! property name to a [`Property`] describing how to read it. This is
//! normally derived with `#[derive(Queryable)]`, but can be written by hand:
//!
//! ```
//! use sifter::{Property, Queryable};
//!
//! struct Task {
//!     title: String,
//!     priority: u8,
//! }
//!
//! impl Queryable for Task {
//!     const FIELDS: &'static [&'static str] = &["title", "priority"];
//!
//!     fn property(name: &str) -> Option<Property<Self>> {
//!         match name {
//!             "title" => Some(Property::scalar(|t: &Task| &t.title)),
//!             "priority" => Some(Property::scalar(|t: &Task| &t.priority)),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::accessor::{ListProperty, Navigate, NestedProperty};
use crate::value::{EnumType, Number, Timestamp, Value, ValueType};

/// Reads a property value out of an item.
pub type ReadFn<T> = Arc<dyn for<'a> Fn(&'a T) -> Value<'a> + Send + Sync>;

/// Wraps a closure as a [`ReadFn`], pinning down its higher-ranked signature.
pub fn read_fn<T, F>(f: F) -> ReadFn<T>
where
    F: for<'a> Fn(&'a T) -> Value<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Trait for types whose properties can be addressed by path.
pub trait Queryable: Sized + Send + Sync + 'static {
    /// Query names of every exposed property.
    const FIELDS: &'static [&'static str];

    /// Returns the property with exactly this query name.
    fn property(name: &str) -> Option<Property<Self>>;

    /// Type name used in diagnostics.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Looks a property up by name, falling back to an ASCII case-insensitive
/// match against [`Queryable::FIELDS`].
pub(crate) fn lookup<T: Queryable>(name: &str) -> Option<Property<T>> {
    T::property(name).or_else(|| {
        T::FIELDS
            .iter()
            .find(|field| field.eq_ignore_ascii_case(name))
            .and_then(|field| T::property(field))
    })
}

/// Maps a Rust field type to a query value.
pub trait FieldValue {
    const TYPE: ValueType;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value<'_>;
}

/// Helper trait for enums queried by variant name.
///
/// Derived with `#[derive(QueryEnum)]` for unit-only enums.
pub trait QueryEnum: Send + Sync + 'static {
    /// Variant names and their stable discriminants.
    const VARIANTS: &'static [(&'static str, u32)];

    fn discriminant(&self) -> u32;

    fn enum_type() -> EnumType {
        EnumType {
            name: std::any::type_name::<Self>(),
            variants: Self::VARIANTS,
        }
    }
}

/// How to read one named property of `T`.
pub struct Property<T> {
    pub(crate) kind: PropertyKind<T>,
}

pub(crate) enum PropertyKind<T> {
    Scalar {
        ty: ValueType,
        nullable: bool,
        read: ReadFn<T>,
    },
    Nested(Arc<dyn Navigate<T>>),
    List(Arc<dyn Navigate<T>>),
}

impl<T: Queryable> Property<T> {
    /// A scalar property read by reference.
    pub fn scalar<V, F>(get: F) -> Self
    where
        V: FieldValue + ?Sized + 'static,
        F: for<'a> Fn(&'a T) -> &'a V + Send + Sync + 'static,
    {
        Self::computed(V::TYPE, V::NULLABLE, move |item| get(item).to_value())
    }

    /// A scalar property with an explicit type and reader.
    pub fn computed<F>(ty: ValueType, nullable: bool, read: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> Value<'a> + Send + Sync + 'static,
    {
        Property {
            kind: PropertyKind::Scalar {
                ty,
                nullable,
                read: read_fn(read),
            },
        }
    }

    /// An enum property.
    pub fn enumeration<E, F>(get: F) -> Self
    where
        E: QueryEnum,
        F: for<'a> Fn(&'a T) -> &'a E + Send + Sync + 'static,
    {
        Self::computed(ValueType::Enum(E::enum_type()), false, move |item| {
            Value::Enum(get(item).discriminant())
        })
    }

    /// An optional enum property.
    pub fn optional_enumeration<E, F>(get: F) -> Self
    where
        E: QueryEnum,
        F: for<'a> Fn(&'a T) -> Option<&'a E> + Send + Sync + 'static,
    {
        Self::computed(ValueType::Enum(E::enum_type()), true, move |item| {
            get(item).map_or(Value::Null, |e| Value::Enum(e.discriminant()))
        })
    }

    /// An embedded object whose own properties continue the path.
    pub fn nested<U, F>(get: F) -> Self
    where
        U: Queryable,
        F: for<'a> Fn(&'a T) -> &'a U + Send + Sync + 'static,
    {
        Self::nested_link::<U, _>(move |item| Some(get(item)), false)
    }

    /// An optional embedded object; a missing link reads as null.
    pub fn optional_nested<U, F>(get: F) -> Self
    where
        U: Queryable,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        Self::nested_link(get, true)
    }

    fn nested_link<U, F>(get: F, optional: bool) -> Self
    where
        U: Queryable,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        Property {
            kind: PropertyKind::Nested(Arc::new(NestedProperty {
                get: Arc::new(get),
                optional,
                _marker: PhantomData,
            })),
        }
    }

    /// A collection of objects, addressed with bracket syntax.
    pub fn list<E, F>(get: F) -> Self
    where
        E: Queryable,
        F: for<'a> Fn(&'a T) -> &'a [E] + Send + Sync + 'static,
    {
        Property {
            kind: PropertyKind::List(Arc::new(ListProperty {
                get: Arc::new(get),
                _marker: PhantomData,
            })),
        }
    }

    /// Returns `true` for scalar properties.
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, PropertyKind::Scalar { .. })
    }

    /// Static type of a scalar property.
    pub fn value_type(&self) -> Option<ValueType> {
        match &self.kind {
            PropertyKind::Scalar { ty, .. } => Some(*ty),
            _ => None,
        }
    }
}

impl FieldValue for String {
    const TYPE: ValueType = ValueType::Text;

    fn to_value(&self) -> Value<'_> {
        Value::String(self.as_str())
    }
}

impl FieldValue for str {
    const TYPE: ValueType = ValueType::Text;

    fn to_value(&self) -> Value<'_> {
        Value::String(self)
    }
}

macro_rules! numeric_field {
    ($ty:expr => $($source:ty),*) => {
        $(
            impl FieldValue for $source {
                const TYPE: ValueType = $ty;

                fn to_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }
        )*
    };
}

numeric_field!(ValueType::Integer => i8, i16, i32, i64, isize);
numeric_field!(ValueType::Unsigned => u8, u16, u32, u64, usize);
numeric_field!(ValueType::Float => f32, f64);

impl FieldValue for bool {
    const TYPE: ValueType = ValueType::Bool;

    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl FieldValue for DateTime<Utc> {
    const TYPE: ValueType = ValueType::Timestamp;

    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from(*self))
    }
}

impl FieldValue for NaiveDateTime {
    const TYPE: ValueType = ValueType::Timestamp;

    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(Timestamp::from(*self))
    }
}

impl FieldValue for NaiveDate {
    const TYPE: ValueType = ValueType::Date;

    fn to_value(&self) -> Value<'_> {
        Value::Date(*self)
    }
}

impl FieldValue for Uuid {
    const TYPE: ValueType = ValueType::Uuid;

    fn to_value(&self) -> Value<'_> {
        Value::Uuid(*self)
    }
}

impl<V: FieldValue> FieldValue for Option<V> {
    const TYPE: ValueType = V::TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}
