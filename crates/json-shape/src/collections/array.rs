//! Array containers.

use super::builtin;
use crate::decl::{SchemaRef, TypeRef};
use crate::error::ShapeResult;
use crate::number::Number;
use crate::object::ShapeObject;
use crate::shape::ShapeHandle;
use crate::store::StoreSlot;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

/// An untyped array.
///
/// Elements of any kind can be kind-checked, read and written by index. Reads past
/// the end yield `None`; writes past the end pad with nulls.
#[derive(Clone, Debug)]
pub struct JsonArray {
    object: ShapeObject,
}

impl Deref for JsonArray {
    type Target = ShapeObject;

    fn deref(&self) -> &ShapeObject {
        &self.object
    }
}

impl ShapeHandle for JsonArray {
    fn schema() -> SchemaRef {
        builtin::json_array_ref()
    }

    fn from_object(object: ShapeObject) -> Self {
        Self { object }
    }

    fn as_object(&self) -> &ShapeObject {
        &self.object
    }

    fn into_object(self) -> ShapeObject {
        self.object
    }
}

impl JsonArray {
    /// Number of elements.
    pub fn len(&self) -> ShapeResult<usize> {
        self.object.length()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> ShapeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Truncate or pad with nulls.
    pub fn set_len(&self, len: usize) -> ShapeResult<()> {
        self.object.set_length(len)
    }

    /// Remove up to `count` elements starting at `index`.
    pub fn remove(&self, index: usize, count: usize) -> ShapeResult<()> {
        self.object.remove_elements(index, count)
    }

    /// Insert before `index`.
    pub fn insert(&self, index: usize, value: StoreSlot) -> ShapeResult<()> {
        self.object.insert_element(index, value)
    }

    /// Insert at the front.
    pub fn prepend(&self, value: StoreSlot) -> ShapeResult<()> {
        self.object.prepend_element(value)
    }

    /// Insert at the end.
    pub fn append(&self, value: StoreSlot) -> ShapeResult<()> {
        self.object.append_element(value)
    }

    /// Whether the element is null or missing.
    pub fn is_null_element(&self, index: usize) -> ShapeResult<bool> {
        self.object.is_null_element(index)
    }

    /// Whether the element holds a boolean.
    pub fn is_boolean_element(&self, index: usize) -> ShapeResult<bool> {
        self.object.is_boolean_element(index)
    }

    /// Whether the element holds a number.
    pub fn is_number_element(&self, index: usize) -> ShapeResult<bool> {
        self.object.is_number_element(index)
    }

    /// Whether the element holds a string.
    pub fn is_string_element(&self, index: usize) -> ShapeResult<bool> {
        self.object.is_string_element(index)
    }

    /// Whether the element holds an object or array.
    pub fn is_object_element(&self, index: usize) -> ShapeResult<bool> {
        self.object.is_object_element(index)
    }

    /// Read a boolean element.
    pub fn get_boolean_element(&self, index: usize) -> ShapeResult<Option<bool>> {
        self.object.get_boolean_element(index)
    }

    /// Write a boolean element.
    pub fn set_boolean_element(&self, index: usize, value: Option<bool>) -> ShapeResult<()> {
        self.object.set_boolean_element(index, value)
    }

    /// Read a number element.
    pub fn get_number_element(&self, index: usize) -> ShapeResult<Option<Number>> {
        self.object.get_number_element(index)
    }

    /// Write a number element.
    pub fn set_number_element(&self, index: usize, value: Option<Number>) -> ShapeResult<()> {
        self.object.set_number_element(index, value)
    }

    /// Read a string element.
    pub fn get_string_element(&self, index: usize) -> ShapeResult<Option<String>> {
        self.object.get_string_element(index)
    }

    /// Write a string element.
    pub fn set_string_element(&self, index: usize, value: Option<String>) -> ShapeResult<()> {
        self.object.set_string_element(index, value)
    }

    /// Read an object element bound to `schema`.
    pub fn get_object_element(
        &self,
        index: usize,
        schema: &SchemaRef,
    ) -> ShapeResult<Option<ShapeObject>> {
        self.object.get_object_element(index, schema)
    }

    /// Write an object element.
    pub fn set_object_element(&self, index: usize, value: Option<&ShapeObject>) -> ShapeResult<()> {
        self.object.set_object_element(index, value)
    }
}

macro_rules! primitive_array {
    (
        $(#[$doc:meta])* $name:ident, $schema:path, $ty:ty, $get:ident, $set:ident
    ) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            array: JsonArray,
        }

        impl Deref for $name {
            type Target = JsonArray;

            fn deref(&self) -> &JsonArray {
                &self.array
            }
        }

        impl ShapeHandle for $name {
            fn schema() -> SchemaRef {
                $schema()
            }

            fn from_object(object: ShapeObject) -> Self {
                Self {
                    array: JsonArray::from_object(object),
                }
            }

            fn as_object(&self) -> &ShapeObject {
                &self.array.object
            }

            fn into_object(self) -> ShapeObject {
                self.array.object
            }
        }

        impl $name {
            /// Read the element at `index`.
            pub fn get(&self, index: usize) -> ShapeResult<Option<$ty>> {
                self.array.$get(index)
            }

            /// Write the element at `index`.
            pub fn set(&self, index: usize, value: Option<$ty>) -> ShapeResult<()> {
                self.array.$set(index, value)
            }

            /// Insert before `index`.
            pub fn insert(&self, index: usize, value: Option<$ty>) -> ShapeResult<()> {
                self.array.insert(index, StoreSlot::from(value))
            }

            /// Insert at the front.
            pub fn prepend(&self, value: Option<$ty>) -> ShapeResult<()> {
                self.array.prepend(StoreSlot::from(value))
            }

            /// Insert at the end.
            pub fn append(&self, value: Option<$ty>) -> ShapeResult<()> {
                self.array.append(StoreSlot::from(value))
            }

            /// Read every element.
            pub fn to_vec(&self) -> ShapeResult<Vec<Option<$ty>>> {
                (0..self.array.len()?).map(|i| self.get(i)).collect()
            }
        }
    };
}

primitive_array!(
    /// Array of nullable booleans.
    BooleanArray, builtin::boolean_array_ref, bool,
    get_boolean_element, set_boolean_element
);
primitive_array!(
    /// Array of nullable numbers.
    NumberArray, builtin::number_array_ref, Number,
    get_number_element, set_number_element
);
primitive_array!(
    /// Array of nullable strings.
    StringArray, builtin::string_array_ref, String,
    get_string_element, set_string_element
);

/// Array of integers.
///
/// Null elements and elements past the end read as `0`.
#[derive(Clone, Debug)]
pub struct IntegerArray {
    array: JsonArray,
}

impl Deref for IntegerArray {
    type Target = JsonArray;

    fn deref(&self) -> &JsonArray {
        &self.array
    }
}

impl ShapeHandle for IntegerArray {
    fn schema() -> SchemaRef {
        builtin::integer_array_ref()
    }

    fn from_object(object: ShapeObject) -> Self {
        Self {
            array: JsonArray::from_object(object),
        }
    }

    fn as_object(&self) -> &ShapeObject {
        &self.array.object
    }

    fn into_object(self) -> ShapeObject {
        self.array.object
    }
}

impl IntegerArray {
    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> ShapeResult<i64> {
        Ok(self
            .array
            .get_number_element(index)?
            .map_or(0, |n| n.as_i64()))
    }

    /// Write the element at `index`.
    pub fn set(&self, index: usize, value: i64) -> ShapeResult<()> {
        self.array.set_number_element(index, Some(Number::Int(value)))
    }

    /// Insert before `index`.
    pub fn insert(&self, index: usize, value: i64) -> ShapeResult<()> {
        self.array.insert(index, StoreSlot::Number(Number::Int(value)))
    }

    /// Insert at the front.
    pub fn prepend(&self, value: i64) -> ShapeResult<()> {
        self.array.prepend(StoreSlot::Number(Number::Int(value)))
    }

    /// Insert at the end.
    pub fn append(&self, value: i64) -> ShapeResult<()> {
        self.array.append(StoreSlot::Number(Number::Int(value)))
    }

    /// Read every element.
    pub fn to_vec(&self) -> ShapeResult<Vec<i64>> {
        (0..self.array.len()?).map(|i| self.get(i)).collect()
    }
}

/// Array of objects viewed as `H`.
///
/// The element schema travels with the handle; [`cast_element`] rebinds it
/// without touching the stored elements.
///
/// [`cast_element`]: ObjectArray::cast_element
pub struct ObjectArray<H = ShapeObject> {
    array: JsonArray,
    element: SchemaRef,
    _element: PhantomData<fn() -> H>,
}

impl<H> Clone for ObjectArray<H> {
    fn clone(&self) -> Self {
        Self {
            array: self.array.clone(),
            element: self.element.clone(),
            _element: PhantomData,
        }
    }
}

impl<H> fmt::Debug for ObjectArray<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectArray")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl<H> Deref for ObjectArray<H> {
    type Target = JsonArray;

    fn deref(&self) -> &JsonArray {
        &self.array
    }
}

impl<H: ShapeHandle> ShapeHandle for ObjectArray<H> {
    fn schema() -> SchemaRef {
        builtin::object_array_ref()
    }

    fn from_object(object: ShapeObject) -> Self {
        let element = object
            .element_schema()
            .cloned()
            .unwrap_or_else(H::schema);
        Self {
            array: JsonArray::from_object(object),
            element,
            _element: PhantomData,
        }
    }

    fn as_object(&self) -> &ShapeObject {
        &self.array.object
    }

    fn into_object(self) -> ShapeObject {
        self.array.object.with_element(self.element)
    }

    fn type_ref() -> TypeRef {
        TypeRef::ObjectArray(H::schema())
    }
}

impl<H: ShapeHandle> ObjectArray<H> {
    /// The element schema.
    pub fn element_schema(&self) -> &SchemaRef {
        &self.element
    }

    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> ShapeResult<Option<H>> {
        Ok(self
            .array
            .get_object_element(index, &self.element)?
            .map(H::from_object))
    }

    /// Write the element at `index`.
    pub fn set(&self, index: usize, value: Option<&H>) -> ShapeResult<()> {
        self.array
            .set_object_element(index, value.map(H::as_object))
    }

    /// Insert before `index`.
    pub fn insert(&self, index: usize, value: Option<&H>) -> ShapeResult<()> {
        self.array.insert(index, slot(value))
    }

    /// Insert at the front.
    pub fn prepend(&self, value: Option<&H>) -> ShapeResult<()> {
        self.array.prepend(slot(value))
    }

    /// Insert at the end.
    pub fn append(&self, value: Option<&H>) -> ShapeResult<()> {
        self.array.append(slot(value))
    }

    /// View the elements as `E`.
    ///
    /// `E`'s schema must be an ancestor or a descendant of the current
    /// element schema.
    pub fn cast_element<E: ShapeHandle>(&self) -> ShapeResult<ObjectArray<E>> {
        let object = self
            .array
            .object
            .clone()
            .with_element(self.element.clone())
            .cast_element(&E::schema())?;
        Ok(ObjectArray::from_object(object))
    }
}

fn slot<H: ShapeHandle>(value: Option<&H>) -> StoreSlot {
    StoreSlot::from(value.map(|h| h.as_object().value().clone()))
}
