//! Map containers.
//!
//! A map is an object whose property names are the keys. Values are read
//! and written through the generic property operations of [`ShapeObject`].

use super::builtin;
use crate::decl::{SchemaRef, TypeRef};
use crate::error::ShapeResult;
use crate::number::Number;
use crate::object::ShapeObject;
use crate::shape::ShapeHandle;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

macro_rules! primitive_map {
    ($(#[$doc:meta])* $name:ident, $schema:path, $ty:ty, $get:ident, $set:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            object: ShapeObject,
        }

        impl Deref for $name {
            type Target = ShapeObject;

            fn deref(&self) -> &ShapeObject {
                &self.object
            }
        }

        impl ShapeHandle for $name {
            fn schema() -> SchemaRef {
                $schema()
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

        impl $name {
            /// Read the value under `key`.
            pub fn get(&self, key: &str) -> ShapeResult<Option<$ty>> {
                self.object.$get(key)
            }

            /// Write the value under `key`; `None` stores null.
            pub fn set(&self, key: &str, value: Option<$ty>) -> ShapeResult<()> {
                self.object.$set(key, value)
            }

            /// Every key.
            pub fn keys(&self) -> ShapeResult<Vec<String>> {
                self.object.property_names()
            }

            /// Whether `key` is present, even if null.
            pub fn contains_key(&self, key: &str) -> ShapeResult<bool> {
                self.object.has_property(key)
            }

            /// Remove `key`; returns whether it was present.
            pub fn remove(&self, key: &str) -> ShapeResult<bool> {
                self.object.delete_property(key)
            }
        }
    };
}

primitive_map!(
    /// Map of nullable booleans.
    BooleanMap, builtin::boolean_map_ref, bool, get_boolean_property, set_boolean_property
);
primitive_map!(
    /// Map of nullable numbers.
    NumberMap, builtin::number_map_ref, Number, get_number_property, set_number_property
);
primitive_map!(
    /// Map of nullable strings.
    StringMap, builtin::string_map_ref, String, get_string_property, set_string_property
);

/// Map of objects viewed as `H`.
pub struct ObjectMap<H = ShapeObject> {
    object: ShapeObject,
    element: SchemaRef,
    _element: PhantomData<fn() -> H>,
}

impl<H> Clone for ObjectMap<H> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            element: self.element.clone(),
            _element: PhantomData,
        }
    }
}

impl<H> fmt::Debug for ObjectMap<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMap")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl<H> Deref for ObjectMap<H> {
    type Target = ShapeObject;

    fn deref(&self) -> &ShapeObject {
        &self.object
    }
}

impl<H: ShapeHandle> ShapeHandle for ObjectMap<H> {
    fn schema() -> SchemaRef {
        builtin::object_map_ref()
    }

    fn from_object(object: ShapeObject) -> Self {
        let element = object
            .element_schema()
            .cloned()
            .unwrap_or_else(H::schema);
        Self {
            object,
            element,
            _element: PhantomData,
        }
    }

    fn as_object(&self) -> &ShapeObject {
        &self.object
    }

    fn into_object(self) -> ShapeObject {
        self.object.with_element(self.element)
    }

    fn type_ref() -> TypeRef {
        TypeRef::ObjectMap(H::schema())
    }
}

impl<H: ShapeHandle> ObjectMap<H> {
    /// The element schema.
    pub fn element_schema(&self) -> &SchemaRef {
        &self.element
    }

    /// Read the value under `key`.
    pub fn get(&self, key: &str) -> ShapeResult<Option<H>> {
        Ok(self
            .object
            .get_object_property(key, &self.element)?
            .map(H::from_object))
    }

    /// Write the value under `key`; `None` stores null.
    pub fn set(&self, key: &str, value: Option<&H>) -> ShapeResult<()> {
        self.object
            .set_object_property(key, value.map(H::as_object))
    }

    /// Every key.
    pub fn keys(&self) -> ShapeResult<Vec<String>> {
        self.object.property_names()
    }

    /// Whether `key` is present, even if null.
    pub fn contains_key(&self, key: &str) -> ShapeResult<bool> {
        self.object.has_property(key)
    }

    /// Remove `key`; returns whether it was present.
    pub fn remove(&self, key: &str) -> ShapeResult<bool> {
        self.object.delete_property(key)
    }

    /// View the values as `E`.
    ///
    /// `E`'s schema must be an ancestor or a descendant of the current
    /// element schema.
    pub fn cast_element<E: ShapeHandle>(&self) -> ShapeResult<ObjectMap<E>> {
        let object = self
            .object
            .clone()
            .with_element(self.element.clone())
            .cast_element(&E::schema())?;
        Ok(ObjectMap::from_object(object))
    }
}
