//! Value adapters.
//!
//! An adapter converts between a declared Rust type `Value` and a type the
//! store can hold (`Property`: `bool`, [`Number`], `String` or
//! [`ShapeObject`]). Adapters are stateless: a fresh instance is built with
//! `Default` for every get and set.

use crate::collections::builtin;
use crate::decl::SchemaRef;
use crate::error::{ShapeError, ShapeResult};
use crate::number::Number;
use crate::object::ShapeObject;
use crate::value::{AdaptedValue, PropertyValue};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A pure conversion pair between a declared type and a store type.
///
/// # Examples
///
/// ```
/// use json_shape::PropertyAdapter;
///
/// #[derive(Default)]
/// struct Celsius;
///
/// impl PropertyAdapter for Celsius {
///     type Value = i32;
///     type Property = String;
///
///     fn to_property(&self, value: i32) -> Option<String> {
///         Some(format!("{value}C"))
///     }
///
///     fn from_property(&self, property: Option<String>) -> i32 {
///         property
///             .and_then(|s| s.trim_end_matches('C').parse().ok())
///             .unwrap_or_default()
///     }
/// }
/// ```
pub trait PropertyAdapter: Default + Send + Sync + 'static {
    /// The declared type.
    type Value: Send + 'static;
    /// The store type.
    type Property: Send + 'static;

    /// Convert a declared value for storage; `None` stores null.
    fn to_property(&self, value: Self::Value) -> Option<Self::Property>;

    /// Convert a stored value (absent or null as `None`) back.
    fn from_property(&self, property: Option<Self::Property>) -> Self::Value;

    /// Schema to bind stored objects to when `Property` is [`ShapeObject`].
    ///
    /// Adapters that name none get the root object schema.
    fn target_schema() -> Option<SchemaRef> {
        None
    }
}

/// The store kind an adapter converts to.
#[derive(Clone, Debug, PartialEq)]
pub enum AdapterKind {
    /// `bool`
    Boolean,
    /// [`Number`]
    Number,
    /// `String`
    String,
    /// [`ShapeObject`] bound to the given schema.
    Object(SchemaRef),
    /// Anything else; rejected when the schema is resolved.
    Unsupported(&'static str),
}

trait ErasedAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn value_type_name(&self) -> &'static str;
    fn value_type_id(&self) -> TypeId;
    fn property_kind(&self) -> AdapterKind;
    fn to_store(&self, value: AdaptedValue) -> ShapeResult<PropertyValue>;
    fn from_store(&self, raw: PropertyValue) -> ShapeResult<AdaptedValue>;
}

struct Shim<A>(PhantomData<fn() -> A>);

impl<A: PropertyAdapter> ErasedAdapter for Shim<A> {
    fn name(&self) -> &'static str {
        type_name::<A>()
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<A::Value>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<A::Value>()
    }

    fn property_kind(&self) -> AdapterKind {
        let id = TypeId::of::<A::Property>();
        if id == TypeId::of::<bool>() {
            AdapterKind::Boolean
        } else if id == TypeId::of::<Number>() {
            AdapterKind::Number
        } else if id == TypeId::of::<String>() {
            AdapterKind::String
        } else if id == TypeId::of::<ShapeObject>() {
            AdapterKind::Object(A::target_schema().unwrap_or_else(builtin::json_object_ref))
        } else {
            AdapterKind::Unsupported(type_name::<A::Property>())
        }
    }

    fn to_store(&self, value: AdaptedValue) -> ShapeResult<PropertyValue> {
        let value = value.downcast::<A::Value>()?;
        property_to_value(A::default().to_property(value))
    }

    fn from_store(&self, raw: PropertyValue) -> ShapeResult<AdaptedValue> {
        let property = value_to_property::<A::Property>(raw)?;
        Ok(AdaptedValue::new(A::default().from_property(property)))
    }
}

fn property_to_value<P: Send + 'static>(property: Option<P>) -> ShapeResult<PropertyValue> {
    let any: Box<dyn Any> = Box::new(property);
    let any = match any.downcast::<Option<bool>>() {
        Ok(v) => return Ok(PropertyValue::Boolean(*v)),
        Err(any) => any,
    };
    let any = match any.downcast::<Option<Number>>() {
        Ok(v) => return Ok(PropertyValue::Number(*v)),
        Err(any) => any,
    };
    let any = match any.downcast::<Option<String>>() {
        Ok(v) => return Ok(PropertyValue::String(*v)),
        Err(any) => any,
    };
    match any.downcast::<Option<ShapeObject>>() {
        Ok(v) => Ok(PropertyValue::Object(*v)),
        Err(_) => Err(ShapeError::value_mismatch(
            "store property type",
            type_name::<P>(),
        )),
    }
}

fn value_to_property<P: 'static>(raw: PropertyValue) -> ShapeResult<Option<P>> {
    let found = raw.kind_name();
    let any: Box<dyn Any> = match raw {
        PropertyValue::Boolean(v) => Box::new(v),
        PropertyValue::Number(v) => Box::new(v),
        PropertyValue::String(v) => Box::new(v),
        PropertyValue::Object(v) => Box::new(v),
        _ => return Err(ShapeError::value_mismatch(type_name::<P>(), found)),
    };
    any.downcast::<Option<P>>()
        .map(|v| *v)
        .map_err(|_| ShapeError::value_mismatch(type_name::<P>(), found))
}

/// A type-erased adapter reference carried by a member declaration.
#[derive(Clone)]
pub struct AdapterRef {
    inner: Arc<dyn ErasedAdapter>,
}

impl AdapterRef {
    /// Reference adapter `A`.
    pub fn of<A: PropertyAdapter>() -> Self {
        Self {
            inner: Arc::new(Shim::<A>(PhantomData)),
        }
    }

    /// The adapter type name.
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Name of the declared value type.
    pub fn value_type_name(&self) -> &'static str {
        self.inner.value_type_name()
    }

    /// Identity of the declared value type.
    pub fn value_type_id(&self) -> TypeId {
        self.inner.value_type_id()
    }

    /// The store kind this adapter converts to.
    pub fn property_kind(&self) -> AdapterKind {
        self.inner.property_kind()
    }

    /// Convert a declared value into a store value.
    pub fn to_store(&self, value: AdaptedValue) -> ShapeResult<PropertyValue> {
        self.inner.to_store(value)
    }

    /// Convert a store value into a declared value.
    pub fn from_store(&self, raw: PropertyValue) -> ShapeResult<AdaptedValue> {
        self.inner.from_store(raw)
    }
}

impl fmt::Debug for AdapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AdapterRef").field(&self.name()).finish()
    }
}
