//! Integration tests for backing store failures.
#![allow(missing_docs)]

use json_shape::{
    BackingStore, ImplementationRegistry, MemoryValue, Number, Operation, PropertyValue,
    SchemaDecl, SchemaRef, ShapeError, ShapeFactory, StoreError, StoreHandle, StoreResult,
    StoreValue, TypeRef,
};
use std::any::Any;
use std::error::Error;
use std::io;
use std::sync::Arc;

/// A store value whose backend has gone away.
struct Unreachable;

fn gone<T>() -> StoreResult<T> {
    Err(StoreError::backend(io::Error::new(
        io::ErrorKind::NotConnected,
        "connection reset",
    )))
}

impl StoreValue for Unreachable {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn is_array(&self) -> bool {
        false
    }

    fn property_names(&self) -> StoreResult<Vec<String>> {
        gone()
    }

    fn has_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn is_null_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn delete_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn is_boolean_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn is_number_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn is_string_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn is_object_property(&self, _name: &str) -> StoreResult<bool> {
        gone()
    }

    fn get_boolean_property(&self, _name: &str) -> StoreResult<Option<bool>> {
        gone()
    }

    fn set_boolean_property(&self, _name: &str, _value: Option<bool>) -> StoreResult<()> {
        gone()
    }

    fn get_number_property(&self, _name: &str) -> StoreResult<Option<Number>> {
        gone()
    }

    fn set_number_property(&self, _name: &str, _value: Option<Number>) -> StoreResult<()> {
        gone()
    }

    fn get_string_property(&self, _name: &str) -> StoreResult<Option<String>> {
        gone()
    }

    fn set_string_property(&self, _name: &str, _value: Option<String>) -> StoreResult<()> {
        gone()
    }

    fn get_object_property(&self, _name: &str) -> StoreResult<Option<StoreHandle>> {
        gone()
    }

    fn set_object_property(&self, _name: &str, _value: Option<StoreHandle>) -> StoreResult<()> {
        gone()
    }
}

struct UnreachableStore;

impl BackingStore for UnreachableStore {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    fn new_object(&self) -> StoreResult<StoreHandle> {
        Ok(Arc::new(Unreachable))
    }

    fn new_array(&self) -> StoreResult<StoreHandle> {
        gone()
    }
}

fn factory() -> ShapeFactory {
    ShapeFactory::builder()
        .store(UnreachableStore)
        .registry(Arc::new(ImplementationRegistry::new()))
        .build()
}

fn gauge() -> SchemaRef {
    SchemaRef::from(
        SchemaDecl::builder("test.store", "Gauge")
            .property("level", TypeRef::F64)
            .build(),
    )
}

#[test]
fn test_failure_is_wrapped_with_source_chain() {
    let gauge = factory().create_dynamic(&gauge(), None).unwrap();
    let err = gauge
        .invoke(Operation::Get, "level", PropertyValue::Unit)
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "backing store failure during get_number_property"
    );
    let store = err.source().unwrap();
    assert_eq!(store.to_string(), "backend failure: connection reset");
    let cause = store.source().unwrap();
    assert_eq!(
        cause.downcast_ref::<io::Error>().map(io::Error::kind),
        Some(io::ErrorKind::NotConnected)
    );
}

#[test]
fn test_setter_failure_names_the_operation() {
    let gauge = factory().create_dynamic(&gauge(), None).unwrap();
    let err = gauge
        .invoke(Operation::Set, "level", PropertyValue::F64(1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        ShapeError::Store {
            operation: "set_number_property",
            source: StoreError::Backend(_)
        }
    ));
}

#[test]
fn test_array_creation_failure() {
    let err = factory()
        .create::<json_shape::NumberArray>()
        .unwrap_err();
    assert!(matches!(
        err,
        ShapeError::Store {
            operation: "new_array",
            ..
        }
    ));
}

#[test]
fn test_foreign_handle_is_rejected() {
    let memory = ShapeFactory::builder()
        .registry(Arc::new(ImplementationRegistry::new()))
        .build();
    let object = memory.create::<json_shape::ShapeObject>().unwrap();
    let err = object
        .set_object_property("child", Some(&factory().create::<json_shape::ShapeObject>().unwrap()))
        .unwrap_err();

    match err {
        ShapeError::Store { source, .. } => {
            assert!(matches!(source, StoreError::ForeignValue { store: "memory" }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_scalar_fixture_is_rejected() {
    let err = MemoryValue::from_json(&serde_json::json!(3)).unwrap_err();
    assert!(matches!(err, StoreError::TypeMismatch { ref key, .. } if key == "$"));
}
