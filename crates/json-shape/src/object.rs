//! The root object handle.
//!
//! A [`ShapeObject`] pairs an implementation with one shared store value.
//! Every typed handle wraps one. Its inherent methods are the generic
//! operations of the root `JsonObject` schema; declared accessors run
//! through [`ShapeObject::invoke`].

use crate::collections::builtin;
use crate::decl::{SchemaId, SchemaRef};
use crate::descriptor::{MethodKey, Operation};
use crate::error::{ShapeError, ShapeResult, StoreResult};
use crate::factory::ShapeFactory;
use crate::number::Number;
use crate::shape::ShapeHandle;
use crate::store::{StoreHandle, StoreSlot, StoreValue};
use crate::synth::Implementation;
use crate::value::PropertyValue;
use std::fmt;
use std::sync::Arc;

/// An implementation bound to a store value.
#[derive(Clone)]
pub struct ShapeObject {
    implementation: Arc<Implementation>,
    value: StoreHandle,
    factory: ShapeFactory,
    element: Option<SchemaRef>,
}

impl ShapeObject {
    pub(crate) fn new(
        implementation: Arc<Implementation>,
        value: StoreHandle,
        factory: ShapeFactory,
    ) -> Self {
        Self {
            implementation,
            value,
            factory,
            element: None,
        }
    }

    /// The bound implementation.
    pub fn implementation(&self) -> &Arc<Implementation> {
        &self.implementation
    }

    /// The schema the object was bound to.
    pub fn schema_id(&self) -> &SchemaId {
        self.implementation.id()
    }

    /// The underlying store value.
    pub fn value(&self) -> &StoreHandle {
        &self.value
    }

    /// The factory nested values are bound through.
    pub fn factory(&self) -> &ShapeFactory {
        &self.factory
    }

    /// Element schema of an array or map container.
    pub fn element_schema(&self) -> Option<&SchemaRef> {
        self.element.as_ref()
    }

    /// Whether both handles share implementation and store value.
    pub fn same_instance(&self, other: &ShapeObject) -> bool {
        Arc::ptr_eq(&self.implementation, &other.implementation)
            && Arc::ptr_eq(&self.value, &other.value)
    }

    /// Run the declared accessor for `operation` on property `name`.
    ///
    /// Getters and predicates take [`PropertyValue::Unit`]; setters return it.
    pub fn invoke(
        &self,
        operation: Operation,
        name: &str,
        arg: PropertyValue,
    ) -> ShapeResult<PropertyValue> {
        let key = MethodKey::new(operation, name);
        let accessor =
            self.implementation
                .accessor(&key)
                .ok_or_else(|| ShapeError::UnknownAccessor {
                    schema: self.schema_id().clone(),
                    key: key.clone(),
                })?;
        accessor.invoke(self, arg)
    }

    /// View this object as `H`.
    ///
    /// Succeeds when `H`'s schema is this object's schema or an ancestor of
    /// it; the result shares this object's implementation and store value.
    pub fn cast<H: ShapeHandle>(&self) -> ShapeResult<H> {
        self.cast_to(&H::schema()).map(H::from_object)
    }

    /// Dynamic form of [`cast`](Self::cast).
    pub fn cast_to(&self, schema: &SchemaRef) -> ShapeResult<ShapeObject> {
        let target = self.factory.registry().get_or_synthesize(schema)?;
        if self.implementation.descends_from(target.id()) {
            Ok(self.clone())
        } else {
            Err(ShapeError::cast(self.schema_id(), target.id()))
        }
    }

    pub(crate) fn with_element(mut self, element: SchemaRef) -> Self {
        self.element = Some(element);
        self
    }

    /// Rebind a container's elements to `element`.
    ///
    /// The current and requested element schemas must be related by
    /// ancestry in either direction. Containers with no element schema
    /// hold root objects.
    pub(crate) fn cast_element(&self, element: &SchemaRef) -> ShapeResult<ShapeObject> {
        let registry = self.factory.registry();
        let current = self
            .element
            .clone()
            .unwrap_or_else(builtin::json_object_ref);
        let from = registry.get_or_synthesize(&current)?;
        let to = registry.get_or_synthesize(element)?;
        if from.descends_from(to.id()) || to.descends_from(from.id()) {
            Ok(self.clone().with_element(element.clone()))
        } else {
            Err(ShapeError::cast(from.id(), to.id()))
        }
    }

    /// Bind a nested store value to `schema`.
    pub(crate) fn bind(&self, schema: &SchemaRef, value: StoreHandle) -> ShapeResult<ShapeObject> {
        self.factory.create_dynamic(schema, Some(value))
    }

    fn store<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&dyn StoreValue) -> StoreResult<T>,
    ) -> ShapeResult<T> {
        f(&*self.value).map_err(|e| ShapeError::store(operation, e))
    }

    /// Whether the store value is an array.
    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    /// Property names in store order.
    pub fn property_names(&self) -> ShapeResult<Vec<String>> {
        self.store("property_names", |v| v.property_names())
    }

    /// Whether the property is present, even if null.
    pub fn has_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("has_property", |v| v.has_property(name))
    }

    /// Whether the property is present and null.
    pub fn is_null_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("is_null_property", |v| v.is_null_property(name))
    }

    /// Remove the property; returns whether it was present.
    pub fn delete_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("delete_property", |v| v.delete_property(name))
    }

    /// Whether the property holds a boolean.
    pub fn is_boolean_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("is_boolean_property", |v| v.is_boolean_property(name))
    }

    /// Whether the property holds a number.
    pub fn is_number_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("is_number_property", |v| v.is_number_property(name))
    }

    /// Whether the property holds a string.
    pub fn is_string_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("is_string_property", |v| v.is_string_property(name))
    }

    /// Whether the property holds an object or array.
    pub fn is_object_property(&self, name: &str) -> ShapeResult<bool> {
        self.store("is_object_property", |v| v.is_object_property(name))
    }

    /// Read a nullable boolean.
    pub fn get_boolean_property(&self, name: &str) -> ShapeResult<Option<bool>> {
        self.store("get_boolean_property", |v| v.get_boolean_property(name))
    }

    /// Write a nullable boolean.
    pub fn set_boolean_property(&self, name: &str, value: Option<bool>) -> ShapeResult<()> {
        self.store("set_boolean_property", |v| {
            v.set_boolean_property(name, value)
        })
    }

    /// Read a nullable number.
    pub fn get_number_property(&self, name: &str) -> ShapeResult<Option<Number>> {
        self.store("get_number_property", |v| v.get_number_property(name))
    }

    /// Write a nullable number.
    pub fn set_number_property(&self, name: &str, value: Option<Number>) -> ShapeResult<()> {
        self.store("set_number_property", |v| v.set_number_property(name, value))
    }

    /// Read a nullable string.
    pub fn get_string_property(&self, name: &str) -> ShapeResult<Option<String>> {
        self.store("get_string_property", |v| v.get_string_property(name))
    }

    /// Write a nullable string.
    pub fn set_string_property(&self, name: &str, value: Option<String>) -> ShapeResult<()> {
        self.store("set_string_property", |v| v.set_string_property(name, value))
    }

    /// Read a nested value bound to `schema`.
    pub fn get_object_property(
        &self,
        name: &str,
        schema: &SchemaRef,
    ) -> ShapeResult<Option<ShapeObject>> {
        match self.store("get_object_property", |v| v.get_object_property(name))? {
            Some(value) => self.bind(schema, value).map(Some),
            None => Ok(None),
        }
    }

    /// Read a nested value as `H`.
    pub fn get_object_property_as<H: ShapeHandle>(&self, name: &str) -> ShapeResult<Option<H>> {
        Ok(self
            .get_object_property(name, &H::schema())?
            .map(H::from_object))
    }

    /// Write a nested value; `None` stores null.
    pub fn set_object_property(&self, name: &str, value: Option<&ShapeObject>) -> ShapeResult<()> {
        let handle = value.map(|o| o.value.clone());
        self.store("set_object_property", |v| v.set_object_property(name, handle))
    }

    pub(crate) fn length(&self) -> ShapeResult<usize> {
        self.store("length", |v| v.length())
    }

    pub(crate) fn set_length(&self, len: usize) -> ShapeResult<()> {
        self.store("set_length", |v| v.set_length(len))
    }

    pub(crate) fn insert_element(&self, index: usize, slot: StoreSlot) -> ShapeResult<()> {
        self.store("insert_element", |v| v.insert_element(index, slot))
    }

    pub(crate) fn prepend_element(&self, slot: StoreSlot) -> ShapeResult<()> {
        self.store("prepend_element", |v| v.prepend_element(slot))
    }

    pub(crate) fn append_element(&self, slot: StoreSlot) -> ShapeResult<()> {
        self.store("append_element", |v| v.append_element(slot))
    }

    pub(crate) fn remove_elements(&self, index: usize, count: usize) -> ShapeResult<()> {
        self.store("remove_elements", |v| v.remove_elements(index, count))
    }

    pub(crate) fn is_null_element(&self, index: usize) -> ShapeResult<bool> {
        self.store("is_null_element", |v| v.is_null_element(index))
    }

    pub(crate) fn is_boolean_element(&self, index: usize) -> ShapeResult<bool> {
        self.store("is_boolean_element", |v| v.is_boolean_element(index))
    }

    pub(crate) fn is_number_element(&self, index: usize) -> ShapeResult<bool> {
        self.store("is_number_element", |v| v.is_number_element(index))
    }

    pub(crate) fn is_string_element(&self, index: usize) -> ShapeResult<bool> {
        self.store("is_string_element", |v| v.is_string_element(index))
    }

    pub(crate) fn is_object_element(&self, index: usize) -> ShapeResult<bool> {
        self.store("is_object_element", |v| v.is_object_element(index))
    }

    pub(crate) fn get_boolean_element(&self, index: usize) -> ShapeResult<Option<bool>> {
        self.store("get_boolean_element", |v| v.get_boolean_element(index))
    }

    pub(crate) fn set_boolean_element(&self, index: usize, value: Option<bool>) -> ShapeResult<()> {
        self.store("set_boolean_element", |v| {
            v.set_boolean_element(index, value)
        })
    }

    pub(crate) fn get_number_element(&self, index: usize) -> ShapeResult<Option<Number>> {
        self.store("get_number_element", |v| v.get_number_element(index))
    }

    pub(crate) fn set_number_element(
        &self,
        index: usize,
        value: Option<Number>,
    ) -> ShapeResult<()> {
        self.store("set_number_element", |v| v.set_number_element(index, value))
    }

    pub(crate) fn get_string_element(&self, index: usize) -> ShapeResult<Option<String>> {
        self.store("get_string_element", |v| v.get_string_element(index))
    }

    pub(crate) fn set_string_element(
        &self,
        index: usize,
        value: Option<String>,
    ) -> ShapeResult<()> {
        self.store("set_string_element", |v| v.set_string_element(index, value))
    }

    pub(crate) fn get_object_element(
        &self,
        index: usize,
        schema: &SchemaRef,
    ) -> ShapeResult<Option<ShapeObject>> {
        match self.store("get_object_element", |v| v.get_object_element(index))? {
            Some(value) => self.bind(schema, value).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn set_object_element(
        &self,
        index: usize,
        value: Option<&ShapeObject>,
    ) -> ShapeResult<()> {
        let handle = value.map(|o| o.value.clone());
        self.store("set_object_element", |v| v.set_object_element(index, handle))
    }
}

impl ShapeHandle for ShapeObject {
    fn schema() -> SchemaRef {
        builtin::json_object_ref()
    }

    fn from_object(object: ShapeObject) -> Self {
        object
    }

    fn as_object(&self) -> &ShapeObject {
        self
    }

    fn into_object(self) -> ShapeObject {
        self
    }
}

impl fmt::Debug for ShapeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ShapeObject");
        s.field("schema", self.schema_id());
        if let Some(element) = &self.element {
            s.field("element", element);
        }
        s.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{SchemaDecl, TypeRef};
    use crate::registry::ImplementationRegistry;
    use crate::store::MemoryValue;
    use serde_json::json;

    fn factory() -> ShapeFactory {
        ShapeFactory::builder()
            .registry(Arc::new(ImplementationRegistry::new()))
            .build()
    }

    fn tagged() -> Arc<SchemaDecl> {
        SchemaDecl::builder("test.object", "Tagged")
            .property("tag", TypeRef::String)
            .build()
    }

    #[test]
    fn test_generic_property_access() {
        let value = MemoryValue::from_json(&json!({"a": 1, "b": "two", "c": null})).unwrap();
        let object = factory()
            .create_dynamic(&builtin::json_object_ref(), Some(value))
            .unwrap();

        assert_eq!(object.property_names().unwrap(), vec!["a", "b", "c"]);
        assert!(object.is_number_property("a").unwrap());
        assert!(object.is_string_property("b").unwrap());
        assert!(object.is_null_property("c").unwrap());
        assert_eq!(object.get_number_property("a").unwrap(), Some(Number::Int(1)));

        object.set_boolean_property("d", Some(false)).unwrap();
        assert!(object.is_boolean_property("d").unwrap());
        assert!(object.delete_property("d").unwrap());
        assert!(!object.has_property("d").unwrap());
    }

    #[test]
    fn test_nested_object_binding() {
        let value = MemoryValue::from_json(&json!({"inner": {"tag": "x"}})).unwrap();
        let object = factory()
            .create_dynamic(&builtin::json_object_ref(), Some(value))
            .unwrap();

        let inner = object
            .get_object_property("inner", &SchemaRef::lazy(tagged))
            .unwrap()
            .unwrap();
        assert_eq!(inner.schema_id().as_str(), "test.object.Tagged");
        let tag = inner
            .invoke(Operation::Get, "tag", PropertyValue::Unit)
            .unwrap();
        assert!(matches!(tag, PropertyValue::String(Some(ref s)) if s == "x"));

        assert!(object
            .get_object_property("missing", &SchemaRef::lazy(tagged))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_accessor() {
        let object = factory()
            .create_dynamic(&SchemaRef::lazy(tagged), None)
            .unwrap();
        let err = object
            .invoke(Operation::Delete, "tag", PropertyValue::Unit)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.object.Tagged declares no accessor delete(tag)"
        );
    }

    #[test]
    fn test_getter_rejects_argument() {
        let object = factory()
            .create_dynamic(&SchemaRef::lazy(tagged), None)
            .unwrap();
        let err = object
            .invoke(Operation::Get, "tag", PropertyValue::I32(1))
            .unwrap_err();
        assert!(matches!(err, ShapeError::ValueMismatch { expected: "unit", .. }));
    }

    #[test]
    fn test_cast_to_root_and_back_fails() {
        let factory = factory();
        let tagged_obj = factory
            .create_dynamic(&SchemaRef::lazy(tagged), None)
            .unwrap();
        let root = tagged_obj.cast::<ShapeObject>().unwrap();
        assert!(root.same_instance(&tagged_obj));

        let plain = factory
            .create_dynamic(&builtin::json_object_ref(), None)
            .unwrap();
        let err = plain.cast_to(&SchemaRef::lazy(tagged)).unwrap_err();
        assert!(err.is_cast());
    }

    #[test]
    fn test_store_errors_name_the_operation() {
        let value = MemoryValue::from_json(&json!({"n": "text"})).unwrap();
        let object = factory()
            .create_dynamic(&builtin::json_object_ref(), Some(value))
            .unwrap();
        let err = object.get_number_property("n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "backing store failure during get_number_property"
        );
    }
}
