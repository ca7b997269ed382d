//! Integration tests for schema inheritance, casts and the registry.
#![allow(missing_docs)]

use json_shape::{
    builtin, AdapterRef, Declared, ImplementationRegistry, MemberDecl, MemoryValue, MethodKey,
    Operation, Origin, PropertyAdapter, PropertyValue, SchemaDecl, SchemaError, SchemaId,
    SchemaRef, ShapeError, ShapeFactory, ShapeObject, StaticImplementation, TypeRef,
};
use serde_json::json;
use std::sync::{Arc, Barrier, OnceLock};
use std::thread;

fn factory() -> ShapeFactory {
    ShapeFactory::builder()
        .registry(Arc::new(ImplementationRegistry::new()))
        .build()
}

fn get<T: Declared>(object: &ShapeObject, name: &str) -> T {
    object
        .invoke(Operation::Get, name, PropertyValue::Unit)
        .and_then(T::from_property)
        .unwrap()
}

fn set<T: Declared>(object: &ShapeObject, name: &str, value: T) {
    object
        .invoke(Operation::Set, name, value.into_property())
        .unwrap();
}

// ============================================================================
// Declarations
// ============================================================================

fn animal() -> Arc<SchemaDecl> {
    static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
    DECL.get_or_init(|| {
        SchemaDecl::builder("zoo", "Animal")
            .property("name", TypeRef::String)
            .property("legs", TypeRef::I32)
            .build()
    })
    .clone()
}

fn dog() -> Arc<SchemaDecl> {
    static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
    DECL.get_or_init(|| {
        SchemaDecl::builder("zoo", "Dog")
            .extends(SchemaRef::lazy(animal))
            .property("good", TypeRef::Bool)
            .build()
    })
    .clone()
}

fn plant() -> Arc<SchemaDecl> {
    static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
    DECL.get_or_init(|| {
        SchemaDecl::builder("zoo", "Plant")
            .property("height", TypeRef::F64)
            .build()
    })
    .clone()
}

fn node() -> Arc<SchemaDecl> {
    static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
    DECL.get_or_init(|| {
        SchemaDecl::builder("zoo", "Node")
            .property("value", TypeRef::I64)
            .property("next", TypeRef::Object(SchemaRef::lazy(node)))
            .build()
    })
    .clone()
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_child_reuses_parent_accessors() {
    let factory = factory();
    let dog = factory.create_dynamic(&SchemaRef::lazy(dog), None).unwrap();
    let registry = factory.registry();
    let parent = registry.get(&animal().id()).unwrap();

    let implementation = dog.implementation();
    assert_eq!(implementation.local_len(), 2);
    assert!(Arc::ptr_eq(implementation.parent().unwrap(), &parent));

    for key in [
        MethodKey::new(Operation::Get, "name"),
        MethodKey::new(Operation::Set, "name"),
        MethodKey::new(Operation::Get, "legs"),
        MethodKey::new(Operation::Set, "legs"),
    ] {
        assert!(Arc::ptr_eq(
            implementation.accessor(&key).unwrap(),
            parent.accessor(&key).unwrap()
        ));
    }

    set(&dog, "name", Some("Rex".to_string()));
    set(&dog, "legs", 4i32);
    set(&dog, "good", true);
    assert_eq!(get::<Option<String>>(&dog, "name"), Some("Rex".to_string()));
    assert_eq!(get::<i32>(&dog, "legs"), 4);
    assert!(get::<bool>(&dog, "good"));
}

#[test]
fn test_ancestor_cast_shares_value_and_implementation() {
    let factory = factory();
    let dog = factory.create_dynamic(&SchemaRef::lazy(dog), None).unwrap();
    set(&dog, "legs", 3i32);

    let as_animal = dog.cast_to(&SchemaRef::lazy(animal)).unwrap();
    assert!(as_animal.same_instance(&dog));
    assert_eq!(get::<i32>(&as_animal, "legs"), 3);

    let as_self = dog.cast_to(&SchemaRef::lazy(self::dog)).unwrap();
    assert!(as_self.same_instance(&dog));

    let as_root = dog.cast::<ShapeObject>().unwrap();
    assert!(Arc::ptr_eq(as_root.value(), dog.value()));
}

#[test]
fn test_unrelated_and_descendant_casts_fail() {
    let factory = factory();
    let dog = factory.create_dynamic(&SchemaRef::lazy(dog), None).unwrap();
    let animal = factory
        .create_dynamic(&SchemaRef::lazy(animal), None)
        .unwrap();

    let err = dog.cast_to(&SchemaRef::lazy(plant)).unwrap_err();
    assert!(err.is_cast());
    assert_eq!(err.to_string(), "cannot cast zoo.Dog to zoo.Plant");

    assert!(animal.cast_to(&SchemaRef::lazy(self::dog)).unwrap_err().is_cast());
}

#[test]
fn test_self_referential_schema() {
    let factory = factory();
    let head = factory.create_dynamic(&SchemaRef::lazy(node), None).unwrap();
    let tail = factory.create_dynamic(&SchemaRef::lazy(node), None).unwrap();
    set(&tail, "value", 2i64);
    set(&head, "value", 1i64);
    set(&head, "next", Some(tail.clone()));

    let next: Option<ShapeObject> = get(&head, "next");
    let next = next.unwrap();
    assert!(next.same_instance(&tail));
    assert_eq!(get::<i64>(&next, "value"), 2);
    assert!(get::<Option<ShapeObject>>(&next, "next").is_none());
    assert_eq!(
        head.to_json_value().unwrap(),
        json!({"value": 1, "next": {"value": 2}})
    );
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_concurrent_creation_synthesizes_once() {
    let factory = factory();
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let factory = factory.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                factory
                    .create_dynamic(&SchemaRef::lazy(plant), None)
                    .unwrap()
            })
        })
        .collect();

    let objects: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for object in &objects[1..] {
        assert!(Arc::ptr_eq(object.implementation(), objects[0].implementation()));
        assert!(!Arc::ptr_eq(object.value(), objects[0].value()));
    }
    assert_eq!(factory.registry().synthesis_count(), 1);
}

#[test]
fn test_repeated_creation_hits_cache() {
    let factory = factory();
    let a = factory.create_dynamic(&SchemaRef::lazy(dog), None).unwrap();
    let count = factory.registry().synthesis_count();
    let b = factory.create_dynamic(&SchemaRef::lazy(dog), None).unwrap();

    assert_eq!(count, 2);
    assert_eq!(factory.registry().synthesis_count(), count);
    assert!(Arc::ptr_eq(a.implementation(), b.implementation()));
}

#[test]
fn test_static_implementation_overrides_synthesis() {
    let factory = factory();
    let schema = SchemaRef::lazy(plant);
    factory
        .registry()
        .register_static(
            &schema,
            StaticImplementation::new()
                .accessor(Operation::Get, "height", |_, _| Ok(PropertyValue::F64(42.0)))
                .accessor(Operation::Set, "height", |object, value| {
                    let height = f64::from_property(value)?;
                    object.set_number_property("height", Some((height * 2.0).into()))?;
                    Ok(PropertyValue::Unit)
                }),
        )
        .unwrap();

    let plant = factory.create_dynamic(&schema, None).unwrap();
    assert_eq!(plant.implementation().origin(), Origin::Static);
    assert_eq!(get::<f64>(&plant, "height"), 42.0);
    set(&plant, "height", 1.5f64);
    assert_eq!(plant.to_json_value().unwrap(), json!({"height": 3.0}));
    assert_eq!(factory.registry().synthesis_count(), 0);
}

#[test]
fn test_static_implementation_must_cover_members() {
    let factory = factory();
    let schema = SchemaRef::lazy(plant);
    factory
        .registry()
        .register_static(
            &schema,
            StaticImplementation::new()
                .accessor(Operation::Get, "height", |_, _| Ok(PropertyValue::F64(0.0))),
        )
        .unwrap();

    let err = factory.create_dynamic(&schema, None).unwrap_err();
    assert!(matches!(
        err,
        ShapeError::Schema(SchemaError::InvalidSignature { .. })
    ));
}

#[test]
fn test_builtins_cannot_be_replaced() {
    let registry = ImplementationRegistry::new();
    let err = registry
        .register_static(&builtin::json_object_ref(), StaticImplementation::new())
        .unwrap_err();
    assert!(matches!(err, ShapeError::AlreadyRegistered { .. }));
}

#[test]
fn test_schema_summary() {
    let factory = factory();
    let dog = factory.create_dynamic(&SchemaRef::lazy(dog), None).unwrap();
    let summary = serde_json::to_value(dog.implementation().schema().summary()).unwrap();

    assert_eq!(summary["id"], "zoo.Dog");
    assert_eq!(summary["parent"], "zoo.Animal");
    let descriptors = summary["descriptors"].as_array().unwrap();
    assert_eq!(descriptors.len(), 6);
    assert_eq!(descriptors[0]["name"], "name");
    assert_eq!(descriptors[0]["operation"], "get");
    assert_eq!(descriptors[0]["inherited"], true);
    assert_eq!(descriptors[5]["name"], "good");
    assert_eq!(descriptors[5]["declared_in"], "zoo.Dog");
    assert_eq!(descriptors[5]["inherited"], false);
}

// ============================================================================
// Declaration errors
// ============================================================================

fn schema_error(decl: Arc<SchemaDecl>) -> SchemaError {
    match factory().create_dynamic(&SchemaRef::from(decl), None) {
        Err(ShapeError::Schema(e)) => e,
        other => panic!("expected a schema error, got {other:?}"),
    }
}

#[test]
fn test_missing_namespace() {
    let err = schema_error(SchemaDecl::builder("", "Loose").build());
    assert_eq!(
        err,
        SchemaError::NotNamespaced {
            schema: SchemaId::new("", "Loose")
        }
    );
}

#[test]
fn test_multiple_supertypes() {
    let err = schema_error(
        SchemaDecl::builder("zoo", "Griffin")
            .extends(SchemaRef::lazy(animal))
            .extends(SchemaRef::lazy(plant))
            .build(),
    );
    assert!(matches!(err, SchemaError::MultipleSupertypes { count: 2, .. }));
}

#[test]
fn test_cyclic_supertypes() {
    fn left() -> Arc<SchemaDecl> {
        static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
        DECL.get_or_init(|| {
            SchemaDecl::builder("zoo", "Left")
                .extends(SchemaRef::lazy(right))
                .build()
        })
        .clone()
    }
    fn right() -> Arc<SchemaDecl> {
        static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
        DECL.get_or_init(|| {
            SchemaDecl::builder("zoo", "Right")
                .extends(SchemaRef::lazy(left))
                .build()
        })
        .clone()
    }

    let err = schema_error(left());
    assert!(matches!(err, SchemaError::CyclicSupertypes { .. }));
}

#[test]
fn test_unannotated_member() {
    let err = schema_error(
        SchemaDecl::builder("zoo", "Helper")
            .member(MemberDecl::new("compute").returns(TypeRef::I32))
            .build(),
    );
    assert!(matches!(err, SchemaError::InvalidSignature { ref member, .. } if member == "compute"));
}

#[test]
fn test_duplicate_local_member() {
    let err = schema_error(
        SchemaDecl::builder("zoo", "Twice")
            .member(MemberDecl::getter("a", "a", TypeRef::I32))
            .member(MemberDecl::getter("also_a", "a", TypeRef::I64))
            .build(),
    );
    assert!(matches!(
        err,
        SchemaError::DuplicateMember {
            operation: Operation::Get,
            ..
        }
    ));
}

#[test]
fn test_redeclared_inherited_member() {
    let err = schema_error(
        SchemaDecl::builder("zoo", "Cat")
            .extends(SchemaRef::lazy(animal))
            .property("legs", TypeRef::I32)
            .build(),
    );
    match err {
        SchemaError::DuplicateMember {
            property, member, ..
        } => {
            assert_eq!(property, "legs");
            assert_eq!(member, "legs");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[derive(Default)]
struct Listy;

impl PropertyAdapter for Listy {
    type Value = String;
    type Property = Vec<String>;

    fn to_property(&self, value: String) -> Option<Vec<String>> {
        Some(vec![value])
    }

    fn from_property(&self, property: Option<Vec<String>>) -> String {
        property.unwrap_or_default().concat()
    }
}

#[test]
fn test_unsupported_adapter_kind() {
    let err = schema_error(
        SchemaDecl::builder("zoo", "Listed")
            .member(
                MemberDecl::getter("words", "words", TypeRef::foreign::<String>())
                    .adapter(AdapterRef::of::<Listy>()),
            )
            .build(),
    );
    assert!(matches!(err, SchemaError::UnsupportedAdapterKind { .. }));
}

#[test]
fn test_declaration_error_is_reported_once() {
    let factory = factory();
    let bad = SchemaRef::from(SchemaDecl::builder("", "Loose").build());
    let first = factory.create_dynamic(&bad, None).unwrap_err();
    let second = factory.create_dynamic(&bad, None).unwrap_err();
    assert_eq!(first.to_string(), second.to_string());
    assert!(factory.registry().get(&bad.id()).is_none());
}

#[test]
fn test_existing_value_keeps_unknown_properties() {
    let value = MemoryValue::from_json(&json!({"height": 2, "color": "green"})).unwrap();
    let plant = factory()
        .create_dynamic(&SchemaRef::lazy(plant), Some(value))
        .unwrap();
    set(&plant, "height", 5.0f64);
    assert_eq!(
        plant.to_json_value().unwrap(),
        json!({"height": 5.0, "color": "green"})
    );
}
