//! Dynamic values passed to and returned from accessors.

use crate::decl::TypeRef;
use crate::error::{ShapeError, ShapeResult};
use crate::number::Number;
use crate::object::ShapeObject;
use crate::shape::ShapeHandle;
use std::any::{type_name, Any};
use std::fmt;

/// A value crossing an accessor boundary.
#[derive(Debug)]
pub enum PropertyValue {
    /// No value: the argument of getters and predicates, the result of setters.
    Unit,
    /// Unboxed `bool`.
    Bool(bool),
    /// Unboxed `i8`.
    I8(i8),
    /// Unboxed `i16`.
    I16(i16),
    /// Unboxed `i32`.
    I32(i32),
    /// Unboxed `i64`.
    I64(i64),
    /// Unboxed `f32`.
    F32(f32),
    /// Unboxed `f64`.
    F64(f64),
    /// `char`.
    Char(char),
    /// Nullable boolean.
    Boolean(Option<bool>),
    /// Nullable number.
    Number(Option<Number>),
    /// Nullable string.
    String(Option<String>),
    /// Nullable nested object, array or map.
    Object(Option<ShapeObject>),
    /// A value of an adapter's declared type.
    Adapted(AdaptedValue),
}

impl PropertyValue {
    /// Name of the variant, for mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Unit => "unit",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::I8(_) => "i8",
            PropertyValue::I16(_) => "i16",
            PropertyValue::I32(_) => "i32",
            PropertyValue::I64(_) => "i64",
            PropertyValue::F32(_) => "f32",
            PropertyValue::F64(_) => "f64",
            PropertyValue::Char(_) => "char",
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::Number(_) => "number",
            PropertyValue::String(_) => "string",
            PropertyValue::Object(_) => "object",
            PropertyValue::Adapted(v) => v.type_name(),
        }
    }

    /// Wrap a value of an adapter's declared type.
    pub fn adapted<T: Send + 'static>(value: T) -> Self {
        PropertyValue::Adapted(AdaptedValue::new(value))
    }

    /// Extract an adapted value of type `T`.
    pub fn into_adapted<T: 'static>(self) -> ShapeResult<T> {
        match self {
            PropertyValue::Adapted(v) => v.downcast(),
            other => Err(ShapeError::value_mismatch(
                type_name::<T>(),
                other.kind_name(),
            )),
        }
    }

    /// Expect a `bool` result.
    pub fn into_bool(self) -> ShapeResult<bool> {
        match self {
            PropertyValue::Bool(v) => Ok(v),
            other => Err(ShapeError::value_mismatch("bool", other.kind_name())),
        }
    }

    /// Expect a unit result.
    pub fn into_unit(self) -> ShapeResult<()> {
        match self {
            PropertyValue::Unit => Ok(()),
            other => Err(ShapeError::value_mismatch("unit", other.kind_name())),
        }
    }
}

/// A boxed value of an adapter's declared type.
pub struct AdaptedValue {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl AdaptedValue {
    /// Box `value`.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the boxed type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Take the value out as `T`.
    pub fn downcast<T: 'static>(self) -> ShapeResult<T> {
        let found = self.type_name;
        self.value
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| ShapeError::value_mismatch(type_name::<T>(), found))
    }
}

impl fmt::Debug for AdaptedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AdaptedValue").field(&self.type_name).finish()
    }
}

/// Rust types that can appear as a getter result or setter parameter.
///
/// Typed handles convert through this trait; schemas built by hand name the
/// same types with [`Declared::type_ref`].
pub trait Declared: Sized {
    /// The declared type reference.
    fn type_ref() -> TypeRef;

    /// Convert into an accessor argument.
    fn into_property(self) -> PropertyValue;

    /// Convert from an accessor result.
    fn from_property(value: PropertyValue) -> ShapeResult<Self>;
}

macro_rules! impl_declared {
    ($ty:ty, $type_ref:ident, $variant:ident) => {
        impl Declared for $ty {
            fn type_ref() -> TypeRef {
                TypeRef::$type_ref
            }

            fn into_property(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_property(value: PropertyValue) -> ShapeResult<Self> {
                match value {
                    PropertyValue::$variant(v) => Ok(v),
                    other => Err(ShapeError::value_mismatch(
                        stringify!($ty),
                        other.kind_name(),
                    )),
                }
            }
        }
    };
}

impl_declared!(bool, Bool, Bool);
impl_declared!(i8, I8, I8);
impl_declared!(i16, I16, I16);
impl_declared!(i32, I32, I32);
impl_declared!(i64, I64, I64);
impl_declared!(f32, F32, F32);
impl_declared!(f64, F64, F64);
impl_declared!(char, Char, Char);
impl_declared!(Option<bool>, Boolean, Boolean);
impl_declared!(Option<Number>, Number, Number);
impl_declared!(Option<String>, String, String);

impl<H: ShapeHandle> Declared for Option<H> {
    fn type_ref() -> TypeRef {
        H::type_ref()
    }

    fn into_property(self) -> PropertyValue {
        PropertyValue::Object(self.map(ShapeHandle::into_object))
    }

    fn from_property(value: PropertyValue) -> ShapeResult<Self> {
        match value {
            PropertyValue::Object(v) => Ok(v.map(H::from_object)),
            other => Err(ShapeError::value_mismatch("object", other.kind_name())),
        }
    }
}
