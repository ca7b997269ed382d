//! In-memory JSON tree store.
//!
//! Each object or array is a [`MemoryValue`] behind an `Arc`, so nested
//! values are shared between every handle that reaches them and writes are
//! immediately visible through all of them. A value can never be nested
//! inside itself, so the tree stays acyclic.

use super::{BackingStore, StoreHandle, StoreSlot, StoreValue};
use crate::error::{StoreError, StoreResult};
use crate::number::Number;
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Backing store producing [`MemoryValue`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

impl BackingStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn new_object(&self) -> StoreResult<StoreHandle> {
        Ok(MemoryValue::object())
    }

    fn new_array(&self) -> StoreResult<StoreHandle> {
        Ok(MemoryValue::array())
    }
}

#[derive(Clone)]
enum Slot {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Value(Arc<MemoryValue>),
}

impl Slot {
    fn kind_name(&self) -> &'static str {
        match self {
            Slot::Null => "null",
            Slot::Boolean(_) => "boolean",
            Slot::Number(_) => "number",
            Slot::String(_) => "string",
            Slot::Value(v) if v.is_array() => "array",
            Slot::Value(_) => "object",
        }
    }
}

fn child(slot: &Slot) -> Option<Arc<MemoryValue>> {
    match slot {
        Slot::Value(v) => Some(v.clone()),
        _ => None,
    }
}

fn pad_to(items: &mut Vec<Slot>, len: usize) -> StoreResult<()> {
    if len > items.len() {
        items
            .try_reserve(len - items.len())
            .map_err(|_| StoreError::CapacityExceeded { requested: len })?;
        items.resize(len, Slot::Null);
    }
    Ok(())
}

fn downcast(handle: StoreHandle) -> StoreResult<Arc<MemoryValue>> {
    handle
        .into_any()
        .downcast::<MemoryValue>()
        .map_err(|_| StoreError::ForeignValue { store: "memory" })
}

fn decode<T>(
    slot: Option<&Slot>,
    key: impl ToString,
    expected: &'static str,
    pick: impl FnOnce(&Slot) -> Option<T>,
) -> StoreResult<Option<T>> {
    match slot {
        None | Some(Slot::Null) => Ok(None),
        Some(slot) => match pick(slot) {
            Some(v) => Ok(Some(v)),
            None => Err(StoreError::type_mismatch(key, expected, slot.kind_name())),
        },
    }
}

fn pick_boolean(slot: &Slot) -> Option<bool> {
    match slot {
        Slot::Boolean(v) => Some(*v),
        _ => None,
    }
}

fn pick_number(slot: &Slot) -> Option<Number> {
    match slot {
        Slot::Number(v) => Some(*v),
        _ => None,
    }
}

fn pick_string(slot: &Slot) -> Option<String> {
    match slot {
        Slot::String(v) => Some(v.clone()),
        _ => None,
    }
}

fn pick_value(slot: &Slot) -> Option<StoreHandle> {
    match slot {
        Slot::Value(v) => Some(v.clone() as StoreHandle),
        _ => None,
    }
}

enum Node {
    Object(BTreeMap<String, Slot>),
    Array(Vec<Slot>),
}

/// One object or array in the in-memory tree.
pub struct MemoryValue {
    array: bool,
    node: RwLock<Node>,
}

impl MemoryValue {
    /// A new empty object.
    pub fn object() -> Arc<Self> {
        Arc::new(Self {
            array: false,
            node: RwLock::new(Node::Object(BTreeMap::new())),
        })
    }

    /// A new empty array.
    pub fn array() -> Arc<Self> {
        Arc::new(Self {
            array: true,
            node: RwLock::new(Node::Array(Vec::new())),
        })
    }

    /// Build a tree from a JSON object or array.
    pub fn from_json(value: &Value) -> StoreResult<Arc<Self>> {
        match value {
            Value::Object(map) => {
                let mut entries = BTreeMap::new();
                for (key, v) in map {
                    entries.insert(key.clone(), slot_from_json(v)?);
                }
                Ok(Arc::new(Self {
                    array: false,
                    node: RwLock::new(Node::Object(entries)),
                }))
            }
            Value::Array(items) => {
                let elements = items
                    .iter()
                    .map(slot_from_json)
                    .collect::<StoreResult<Vec<_>>>()?;
                Ok(Arc::new(Self {
                    array: true,
                    node: RwLock::new(Node::Array(elements)),
                }))
            }
            other => Err(StoreError::type_mismatch(
                "$",
                "object or array",
                value_type_name(other),
            )),
        }
    }

    /// Snapshot the tree as JSON.
    ///
    /// Numbers JSON cannot represent (NaN, infinities) become null.
    pub fn to_json(&self) -> StoreResult<Value> {
        let guard = self.read()?;
        match &*guard {
            Node::Object(map) => {
                let mut out = serde_json::Map::new();
                for (key, slot) in map {
                    out.insert(key.clone(), slot_to_json(slot)?);
                }
                Ok(Value::Object(out))
            }
            Node::Array(items) => Ok(Value::Array(
                items.iter().map(slot_to_json).collect::<StoreResult<_>>()?,
            )),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Node>> {
        self.node.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Node>> {
        self.node.write().map_err(|_| StoreError::Poisoned)
    }

    fn with_object<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&BTreeMap<String, Slot>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        match &*self.read()? {
            Node::Object(map) => f(map),
            Node::Array(_) => Err(StoreError::NotAnObject { operation }),
        }
    }

    fn with_object_mut<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut BTreeMap<String, Slot>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        match &mut *self.write()? {
            Node::Object(map) => f(map),
            Node::Array(_) => Err(StoreError::NotAnObject { operation }),
        }
    }

    fn with_array<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Vec<Slot>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        match &*self.read()? {
            Node::Array(items) => f(items),
            Node::Object(_) => Err(StoreError::NotAnArray { operation }),
        }
    }

    fn with_array_mut<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Vec<Slot>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        match &mut *self.write()? {
            Node::Array(items) => f(items),
            Node::Object(_) => Err(StoreError::NotAnArray { operation }),
        }
    }

    fn set_property(&self, operation: &'static str, name: &str, slot: Slot) -> StoreResult<()> {
        self.with_object_mut(operation, |map| {
            map.insert(name.to_string(), slot);
            Ok(())
        })
    }

    fn property_is(
        &self,
        operation: &'static str,
        name: &str,
        test: impl FnOnce(&Slot) -> bool,
    ) -> StoreResult<bool> {
        self.with_object(operation, |map| Ok(map.get(name).is_some_and(test)))
    }

    fn set_element(&self, operation: &'static str, index: usize, slot: Slot) -> StoreResult<()> {
        self.with_array_mut(operation, |items| {
            let len = index.checked_add(1).ok_or(StoreError::IndexOutOfBounds {
                index,
                len: items.len(),
            })?;
            pad_to(items, len)?;
            items[index] = slot;
            Ok(())
        })
    }

    /// Whether `self` is `value` or reachable from it.
    ///
    /// Must run without holding this value's lock.
    fn reachable_from(&self, value: &Arc<MemoryValue>) -> StoreResult<bool> {
        let target: *const MemoryValue = self;
        let mut seen = HashSet::new();
        let mut pending = vec![value.clone()];
        while let Some(node) = pending.pop() {
            if std::ptr::eq(Arc::as_ptr(&node), target) {
                return Ok(true);
            }
            if !seen.insert(Arc::as_ptr(&node)) {
                continue;
            }
            match &*node.read()? {
                Node::Object(map) => pending.extend(map.values().filter_map(child)),
                Node::Array(items) => pending.extend(items.iter().filter_map(child)),
            }
        }
        Ok(false)
    }

    fn nest(&self, operation: &'static str, handle: StoreHandle) -> StoreResult<Slot> {
        let value = downcast(handle)?;
        if self.reachable_from(&value)? {
            return Err(StoreError::CyclicValue { operation });
        }
        Ok(Slot::Value(value))
    }

    fn accept(&self, operation: &'static str, slot: StoreSlot) -> StoreResult<Slot> {
        Ok(match slot {
            StoreSlot::Null => Slot::Null,
            StoreSlot::Boolean(v) => Slot::Boolean(v),
            StoreSlot::Number(v) => Slot::Number(v),
            StoreSlot::String(v) => Slot::String(v),
            StoreSlot::Value(handle) => self.nest(operation, handle)?,
        })
    }

    fn element_is(
        &self,
        operation: &'static str,
        index: usize,
        test: impl FnOnce(&Slot) -> bool,
    ) -> StoreResult<bool> {
        self.with_array(operation, |items| Ok(items.get(index).is_some_and(test)))
    }
}

impl std::fmt::Debug for MemoryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.array { "array" } else { "object" };
        f.debug_tuple("MemoryValue").field(&kind).finish()
    }
}

fn slot_from_json(value: &Value) -> StoreResult<Slot> {
    Ok(match value {
        Value::Null => Slot::Null,
        Value::Bool(v) => Slot::Boolean(*v),
        Value::Number(n) => Slot::Number(n.into()),
        Value::String(s) => Slot::String(s.clone()),
        Value::Array(_) | Value::Object(_) => Slot::Value(MemoryValue::from_json(value)?),
    })
}

fn slot_to_json(slot: &Slot) -> StoreResult<Value> {
    Ok(match slot {
        Slot::Null => Value::Null,
        Slot::Boolean(v) => Value::Bool(*v),
        Slot::Number(n) => n.to_json().map(Value::Number).unwrap_or(Value::Null),
        Slot::String(s) => Value::String(s.clone()),
        Slot::Value(v) => v.to_json()?,
    })
}

/// Get the type name of a JSON value.
#[inline]
pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl StoreValue for MemoryValue {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn is_array(&self) -> bool {
        self.array
    }

    fn property_names(&self) -> StoreResult<Vec<String>> {
        self.with_object("property_names", |map| Ok(map.keys().cloned().collect()))
    }

    fn has_property(&self, name: &str) -> StoreResult<bool> {
        self.property_is("has_property", name, |_| true)
    }

    fn is_null_property(&self, name: &str) -> StoreResult<bool> {
        self.property_is("is_null_property", name, |s| matches!(s, Slot::Null))
    }

    fn delete_property(&self, name: &str) -> StoreResult<bool> {
        self.with_object_mut("delete_property", |map| Ok(map.remove(name).is_some()))
    }

    fn is_boolean_property(&self, name: &str) -> StoreResult<bool> {
        self.property_is("is_boolean_property", name, |s| {
            matches!(s, Slot::Boolean(_))
        })
    }

    fn is_number_property(&self, name: &str) -> StoreResult<bool> {
        self.property_is("is_number_property", name, |s| matches!(s, Slot::Number(_)))
    }

    fn is_string_property(&self, name: &str) -> StoreResult<bool> {
        self.property_is("is_string_property", name, |s| matches!(s, Slot::String(_)))
    }

    fn is_object_property(&self, name: &str) -> StoreResult<bool> {
        self.property_is("is_object_property", name, |s| matches!(s, Slot::Value(_)))
    }

    fn get_boolean_property(&self, name: &str) -> StoreResult<Option<bool>> {
        self.with_object("get_boolean_property", |map| {
            decode(map.get(name), name, "boolean", pick_boolean)
        })
    }

    fn set_boolean_property(&self, name: &str, value: Option<bool>) -> StoreResult<()> {
        let slot = value.map_or(Slot::Null, Slot::Boolean);
        self.set_property("set_boolean_property", name, slot)
    }

    fn get_number_property(&self, name: &str) -> StoreResult<Option<Number>> {
        self.with_object("get_number_property", |map| {
            decode(map.get(name), name, "number", pick_number)
        })
    }

    fn set_number_property(&self, name: &str, value: Option<Number>) -> StoreResult<()> {
        let slot = value.map_or(Slot::Null, Slot::Number);
        self.set_property("set_number_property", name, slot)
    }

    fn get_string_property(&self, name: &str) -> StoreResult<Option<String>> {
        self.with_object("get_string_property", |map| {
            decode(map.get(name), name, "string", pick_string)
        })
    }

    fn set_string_property(&self, name: &str, value: Option<String>) -> StoreResult<()> {
        let slot = value.map_or(Slot::Null, Slot::String);
        self.set_property("set_string_property", name, slot)
    }

    fn get_object_property(&self, name: &str) -> StoreResult<Option<StoreHandle>> {
        self.with_object("get_object_property", |map| {
            decode(map.get(name), name, "object", pick_value)
        })
    }

    fn set_object_property(&self, name: &str, value: Option<StoreHandle>) -> StoreResult<()> {
        let slot = match value {
            Some(handle) => self.nest("set_object_property", handle)?,
            None => Slot::Null,
        };
        self.set_property("set_object_property", name, slot)
    }

    fn length(&self) -> StoreResult<usize> {
        self.with_array("length", |items| Ok(items.len()))
    }

    fn set_length(&self, len: usize) -> StoreResult<()> {
        self.with_array_mut("set_length", |items| {
            items.truncate(len);
            pad_to(items, len)
        })
    }

    fn insert_element(&self, index: usize, value: StoreSlot) -> StoreResult<()> {
        let slot = self.accept("insert_element", value)?;
        self.with_array_mut("insert_element", |items| {
            if index > items.len() {
                return Err(StoreError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, slot);
            Ok(())
        })
    }

    fn append_element(&self, value: StoreSlot) -> StoreResult<()> {
        let slot = self.accept("append_element", value)?;
        self.with_array_mut("append_element", |items| {
            items.push(slot);
            Ok(())
        })
    }

    fn remove_elements(&self, index: usize, count: usize) -> StoreResult<()> {
        self.with_array_mut("remove_elements", |items| {
            if index > items.len() {
                return Err(StoreError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            let end = index.saturating_add(count).min(items.len());
            items.drain(index..end);
            Ok(())
        })
    }

    fn is_null_element(&self, index: usize) -> StoreResult<bool> {
        self.with_array("is_null_element", |items| {
            Ok(matches!(items.get(index), None | Some(Slot::Null)))
        })
    }

    fn is_boolean_element(&self, index: usize) -> StoreResult<bool> {
        self.element_is("is_boolean_element", index, |s| {
            matches!(s, Slot::Boolean(_))
        })
    }

    fn is_number_element(&self, index: usize) -> StoreResult<bool> {
        self.element_is("is_number_element", index, |s| matches!(s, Slot::Number(_)))
    }

    fn is_string_element(&self, index: usize) -> StoreResult<bool> {
        self.element_is("is_string_element", index, |s| matches!(s, Slot::String(_)))
    }

    fn is_object_element(&self, index: usize) -> StoreResult<bool> {
        self.element_is("is_object_element", index, |s| matches!(s, Slot::Value(_)))
    }

    fn get_boolean_element(&self, index: usize) -> StoreResult<Option<bool>> {
        self.with_array("get_boolean_element", |items| {
            decode(items.get(index), index, "boolean", pick_boolean)
        })
    }

    fn set_boolean_element(&self, index: usize, value: Option<bool>) -> StoreResult<()> {
        let slot = value.map_or(Slot::Null, Slot::Boolean);
        self.set_element("set_boolean_element", index, slot)
    }

    fn get_number_element(&self, index: usize) -> StoreResult<Option<Number>> {
        self.with_array("get_number_element", |items| {
            decode(items.get(index), index, "number", pick_number)
        })
    }

    fn set_number_element(&self, index: usize, value: Option<Number>) -> StoreResult<()> {
        let slot = value.map_or(Slot::Null, Slot::Number);
        self.set_element("set_number_element", index, slot)
    }

    fn get_string_element(&self, index: usize) -> StoreResult<Option<String>> {
        self.with_array("get_string_element", |items| {
            decode(items.get(index), index, "string", pick_string)
        })
    }

    fn set_string_element(&self, index: usize, value: Option<String>) -> StoreResult<()> {
        let slot = value.map_or(Slot::Null, Slot::String);
        self.set_element("set_string_element", index, slot)
    }

    fn get_object_element(&self, index: usize) -> StoreResult<Option<StoreHandle>> {
        self.with_array("get_object_element", |items| {
            decode(items.get(index), index, "object", pick_value)
        })
    }

    fn set_object_element(&self, index: usize, value: Option<StoreHandle>) -> StoreResult<()> {
        let slot = match value {
            Some(handle) => self.nest("set_object_element", handle)?,
            None => Slot::Null,
        };
        self.set_element("set_object_element", index, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_name() {
        assert_eq!(value_type_name(&json!(null)), "null");
        assert_eq!(value_type_name(&json!(true)), "boolean");
        assert_eq!(value_type_name(&json!(42)), "number");
        assert_eq!(value_type_name(&json!("hello")), "string");
        assert_eq!(value_type_name(&json!([1, 2, 3])), "array");
        assert_eq!(value_type_name(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_json_round_trip() {
        let doc = json!({
            "name": "Alice",
            "age": 30,
            "ratio": 0.5,
            "active": true,
            "missing": null,
            "tags": ["a", 1, null, {"deep": false}]
        });
        let value = MemoryValue::from_json(&doc).unwrap();
        assert_eq!(value.to_json().unwrap(), doc);
    }

    #[test]
    fn test_scalar_root_rejected() {
        let err = MemoryValue::from_json(&json!(3)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TypeMismatch {
                found: "number",
                ..
            }
        ));
    }

    #[test]
    fn test_absent_and_null_properties() {
        let value = MemoryValue::from_json(&json!({"n": null})).unwrap();

        assert!(value.has_property("n").unwrap());
        assert!(value.is_null_property("n").unwrap());
        assert_eq!(value.get_number_property("n").unwrap(), None);

        assert!(!value.has_property("x").unwrap());
        assert!(!value.is_null_property("x").unwrap());
        assert_eq!(value.get_string_property("x").unwrap(), None);
    }

    #[test]
    fn test_typed_read_of_wrong_kind() {
        let value = MemoryValue::from_json(&json!({"s": "text"})).unwrap();
        let err = value.get_number_property("s").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch at 's': expected number, found string"
        );
        assert!(value.is_string_property("s").unwrap());
        assert!(!value.is_number_property("s").unwrap());
    }

    #[test]
    fn test_delete_reports_presence() {
        let value = MemoryValue::object();
        value.set_boolean_property("b", Some(true)).unwrap();
        assert!(value.delete_property("b").unwrap());
        assert!(!value.delete_property("b").unwrap());
    }

    #[test]
    fn test_nested_values_are_shared() {
        let parent = MemoryValue::object();
        let child = MemoryValue::object();
        parent
            .set_object_property("child", Some(child.clone() as StoreHandle))
            .unwrap();
        child.set_number_property("n", Some(Number::Int(5))).unwrap();

        let read = parent.get_object_property("child").unwrap().unwrap();
        assert_eq!(read.get_number_property("n").unwrap(), Some(Number::Int(5)));
        assert_eq!(parent.to_json().unwrap(), json!({"child": {"n": 5}}));
    }

    #[test]
    fn test_array_operations() {
        let array = MemoryValue::array();
        array.append_element(StoreSlot::Number(Number::Int(2))).unwrap();
        array.prepend_element(StoreSlot::Number(Number::Int(1))).unwrap();
        array.insert_element(2, StoreSlot::String("c".into())).unwrap();
        assert_eq!(array.to_json().unwrap(), json!([1, 2, "c"]));

        array.set_boolean_element(5, Some(true)).unwrap();
        assert_eq!(array.length().unwrap(), 6);
        assert!(array.is_null_element(4).unwrap());
        assert!(array.is_null_element(99).unwrap());

        array.remove_elements(1, 3).unwrap();
        assert_eq!(array.to_json().unwrap(), json!([1, null, true]));

        array.set_length(1).unwrap();
        assert_eq!(array.to_json().unwrap(), json!([1]));

        let err = array.insert_element(3, StoreSlot::Null).unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfBounds { index: 3, len: 1 }));
    }

    #[test]
    fn test_unreachable_lengths_are_errors() {
        let array = MemoryValue::array();
        array.append_element(StoreSlot::Boolean(true)).unwrap();

        let err = array
            .set_number_element(usize::MAX, Some(Number::Int(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::IndexOutOfBounds {
                index: usize::MAX,
                len: 1
            }
        ));

        let err = array.set_string_element(usize::MAX - 1, None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::CapacityExceeded {
                requested: usize::MAX
            }
        ));
        assert!(matches!(
            array.set_length(usize::MAX / 2).unwrap_err(),
            StoreError::CapacityExceeded { .. }
        ));

        assert_eq!(array.to_json().unwrap(), json!([true]));
    }

    #[test]
    fn test_value_cannot_contain_itself() {
        let root = MemoryValue::object();
        let child = MemoryValue::object();
        let list = MemoryValue::array();
        root.set_object_property("child", Some(child.clone() as StoreHandle))
            .unwrap();
        child
            .set_object_property("list", Some(list.clone() as StoreHandle))
            .unwrap();

        let err = root
            .set_object_property("me", Some(root.clone() as StoreHandle))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::CyclicValue {
                operation: "set_object_property"
            }
        ));
        assert!(matches!(
            list.append_element(StoreSlot::Value(root.clone() as StoreHandle))
                .unwrap_err(),
            StoreError::CyclicValue { .. }
        ));
        assert!(list
            .set_object_element(0, Some(child.clone() as StoreHandle))
            .is_err());

        // Sharing a value in two places is fine.
        root.set_object_property("again", Some(list.clone() as StoreHandle))
            .unwrap();
        assert_eq!(
            root.to_json().unwrap(),
            json!({"again": [], "child": {"list": []}})
        );
    }

    #[test]
    fn test_kind_mismatch_between_object_and_array() {
        let object = MemoryValue::object();
        assert!(matches!(
            object.length().unwrap_err(),
            StoreError::NotAnArray { operation: "length" }
        ));

        let array = MemoryValue::array();
        assert!(matches!(
            array.has_property("x").unwrap_err(),
            StoreError::NotAnObject { .. }
        ));
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let value = MemoryValue::object();
        value
            .set_number_property("n", Some(Number::Float(f64::NAN)))
            .unwrap();
        assert_eq!(value.to_json().unwrap(), json!({"n": null}));
    }
}
