//! Integration tests for `#[derive(Shape)]`.
#![cfg(feature = "derive")]
#![allow(missing_docs, dead_code)]

use json_shape::{
    ImplementationRegistry, MemoryValue, MethodKey, Number, NumberArray, ObjectArray, Operation,
    PropertyAdapter, Shape, ShapeError, ShapeFactory, ShapeHandle, StoreError, StoreHandle,
};
use serde_json::json;
use std::sync::Arc;

fn factory() -> ShapeFactory {
    ShapeFactory::builder()
        .registry(Arc::new(ImplementationRegistry::new()))
        .build()
}

// ============================================================================
// Shapes
// ============================================================================

#[derive(Shape)]
#[shape(namespace = "test.derive")]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Shape)]
#[shape(namespace = "test.derive")]
struct Animal {
    #[shape(get, set, has, is_null, delete)]
    name: Option<String>,
    legs: i32,
}

#[derive(Shape)]
#[shape(namespace = "test.derive", name = "Hound", extends = "Animal")]
struct Dog {
    #[shape(get, set, has)]
    good: bool,
    #[shape(rename = "tag_id")]
    tag: Option<String>,
}

#[derive(Shape)]
#[shape(namespace = "test.derive")]
struct Node {
    id: i32,
    next: Option<NodeRef>,
}

#[derive(Default)]
struct Hex;

impl PropertyAdapter for Hex {
    type Value = Vec<u8>;
    type Property = String;

    fn to_property(&self, value: Vec<u8>) -> Option<String> {
        Some(value.iter().map(|b| format!("{b:02x}")).collect())
    }

    fn from_property(&self, property: Option<String>) -> Vec<u8> {
        let s = property.unwrap_or_default();
        (0..s.len())
            .step_by(2)
            .filter_map(|i| s.get(i..i + 2))
            .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
            .collect()
    }
}

#[derive(Shape)]
#[shape(namespace = "test.derive")]
struct Track {
    #[shape(adapter = "Hex")]
    checksum: Vec<u8>,
    points: Option<ObjectArray<PointRef>>,
    weights: Option<NumberArray>,
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_generated_getters_and_setters() {
    let point = factory().create::<PointRef>().unwrap();
    assert_eq!(point.x().unwrap(), 0.0);

    point.set_x(1.5).unwrap();
    point.set_y(-2.0).unwrap();
    assert_eq!((point.x().unwrap(), point.y().unwrap()), (1.5, -2.0));
    assert_eq!(point.to_json_value().unwrap(), json!({"x": 1.5, "y": -2.0}));
}

#[test]
fn test_declaration_names_schema() {
    let decl = <Dog as Shape>::declaration();
    assert_eq!(decl.id().as_str(), "test.derive.Hound");
    assert_eq!(decl.supertypes().len(), 1);
    assert!(Arc::ptr_eq(&decl, &<Dog as Shape>::declaration()));

    let methods: Vec<&str> = decl.members().iter().map(|m| m.method()).collect();
    assert_eq!(methods, vec!["good", "set_good", "has_good", "tag", "set_tag"]);
}

#[test]
fn test_presence_predicates() {
    let animal = factory().create::<AnimalRef>().unwrap();
    assert!(!animal.has_name().unwrap());

    animal.set_name(None).unwrap();
    assert!(animal.has_name().unwrap());
    assert!(animal.is_name_null().unwrap());

    animal.set_name(Some("rex".into())).unwrap();
    assert!(!animal.is_name_null().unwrap());
    assert!(animal.delete_name().unwrap());
    assert!(!animal.delete_name().unwrap());
    assert_eq!(animal.name().unwrap(), None);
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_inherited_methods_through_deref() {
    let factory = factory();
    let dog = factory.create::<DogRef>().unwrap();
    dog.set_legs(4).unwrap();
    dog.set_name(Some("fido".into())).unwrap();
    dog.set_good(true).unwrap();
    dog.set_tag(Some("A-1".into())).unwrap();

    assert_eq!(dog.legs().unwrap(), 4);
    assert!(dog.has_good().unwrap());
    assert_eq!(
        dog.to_json_value().unwrap(),
        json!({"legs": 4, "name": "fido", "good": true, "tag_id": "A-1"})
    );

    let get_legs = MethodKey::new(Operation::Get, "legs");
    let animal_impl = factory
        .registry()
        .get_or_synthesize(&AnimalRef::schema())
        .unwrap();
    assert!(Arc::ptr_eq(
        dog.implementation().accessor(&get_legs).unwrap(),
        animal_impl.accessor(&get_legs).unwrap()
    ));
}

#[test]
fn test_cast_to_ancestor_only() {
    let factory = factory();
    let dog = factory.create::<DogRef>().unwrap();
    dog.set_legs(3).unwrap();

    let animal = dog.cast::<AnimalRef>().unwrap();
    assert_eq!(animal.legs().unwrap(), 3);
    assert!(animal.same_instance(&dog));

    let err = animal.cast::<PointRef>().unwrap_err();
    assert!(err.is_cast());

    let plain = factory.create::<AnimalRef>().unwrap();
    assert!(plain.cast::<DogRef>().is_err());
}

// ============================================================================
// Nested and recursive shapes
// ============================================================================

#[test]
fn test_self_referential_shape() {
    let value: StoreHandle =
        MemoryValue::from_json(&json!({"id": 1, "next": {"id": 2, "next": null}})).unwrap();
    let head = factory().create_with::<NodeRef>(value).unwrap();

    let second = head.next().unwrap().unwrap();
    assert_eq!(second.id().unwrap(), 2);
    assert!(second.next().unwrap().is_none());

    let third = factory().create::<NodeRef>().unwrap();
    third.set_id(3).unwrap();
    second.set_next(Some(third.clone())).unwrap();
    let again = head.next().unwrap().unwrap().next().unwrap().unwrap();
    assert!(again.same_instance(&third));

    // Closing the loop would make the value contain itself.
    let err = third.set_next(Some(head.clone())).unwrap_err();
    assert!(matches!(
        err,
        ShapeError::Store {
            operation: "set_object_property",
            source: StoreError::CyclicValue { .. },
        }
    ));
}

#[test]
fn test_adapter_field() {
    let track = factory().create::<TrackRef>().unwrap();
    assert!(track.checksum().unwrap().is_empty());

    track.set_checksum(vec![0xde, 0xad]).unwrap();
    assert_eq!(track.checksum().unwrap(), vec![0xde, 0xad]);
    assert_eq!(
        track.get_string_property("checksum").unwrap(),
        Some("dead".to_string())
    );
}

#[test]
fn test_container_fields() {
    let factory = factory();
    let track = factory.create::<TrackRef>().unwrap();
    assert!(track.points().unwrap().is_none());

    let points = factory.create::<ObjectArray<PointRef>>().unwrap();
    let origin = factory.create::<PointRef>().unwrap();
    points.append(Some(&origin)).unwrap();
    track.set_points(Some(points)).unwrap();

    let weights = factory.create::<NumberArray>().unwrap();
    weights.append(Some(Number::Int(2))).unwrap();
    track.set_weights(Some(weights)).unwrap();

    // Writes through a read handle land in the same store value.
    let first = track.points().unwrap().unwrap().get(0).unwrap().unwrap();
    first.set_x(9.0).unwrap();
    assert_eq!(origin.x().unwrap(), 9.0);

    assert_eq!(
        track.to_json_value().unwrap(),
        json!({"points": [{"x": 9.0}], "weights": [2]})
    );
}
