//! Backing store protocol.
//!
//! Every shape reads and writes through [`StoreValue`]. A value is either an
//! object (named properties) or an array (indexed elements); both are shared
//! by reference through a [`StoreHandle`] and never copied by the engine.

mod memory;

pub use memory::{value_type_name, MemoryStore, MemoryValue};

use crate::error::{StoreError, StoreResult};
use crate::number::Number;
use std::any::Any;
use std::sync::Arc;

/// A shared reference to one store value.
pub type StoreHandle = Arc<dyn StoreValue>;

/// Source of fresh store values.
pub trait BackingStore: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// A new empty object.
    fn new_object(&self) -> StoreResult<StoreHandle>;

    /// A new empty array.
    fn new_array(&self) -> StoreResult<StoreHandle>;
}

/// A value written into an array slot.
#[derive(Clone)]
pub enum StoreSlot {
    /// JSON null.
    Null,
    /// A boolean.
    Boolean(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A nested object or array.
    Value(StoreHandle),
}

impl From<Option<bool>> for StoreSlot {
    fn from(v: Option<bool>) -> Self {
        v.map_or(StoreSlot::Null, StoreSlot::Boolean)
    }
}

impl From<Option<Number>> for StoreSlot {
    fn from(v: Option<Number>) -> Self {
        v.map_or(StoreSlot::Null, StoreSlot::Number)
    }
}

impl From<Option<String>> for StoreSlot {
    fn from(v: Option<String>) -> Self {
        v.map_or(StoreSlot::Null, StoreSlot::String)
    }
}

impl From<Option<StoreHandle>> for StoreSlot {
    fn from(v: Option<StoreHandle>) -> Self {
        v.map_or(StoreSlot::Null, StoreSlot::Value)
    }
}

impl std::fmt::Debug for StoreSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreSlot::Null => f.write_str("Null"),
            StoreSlot::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            StoreSlot::Number(v) => f.debug_tuple("Number").field(v).finish(),
            StoreSlot::String(v) => f.debug_tuple("String").field(v).finish(),
            StoreSlot::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// One object or array held by a backing store.
///
/// Absent and null properties both read as `None`; use
/// [`has_property`](Self::has_property) and
/// [`is_null_property`](Self::is_null_property) to tell them apart. Array
/// operations default to [`StoreError::NotAnArray`] so object-only stores
/// need not implement them.
pub trait StoreValue: Send + Sync + 'static {
    /// Recover the concrete value type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Whether this value is an array.
    fn is_array(&self) -> bool;

    /// Property names, in the store's iteration order.
    fn property_names(&self) -> StoreResult<Vec<String>>;

    /// Whether the property is present, even if null.
    fn has_property(&self, name: &str) -> StoreResult<bool>;

    /// Whether the property is present and null.
    fn is_null_property(&self, name: &str) -> StoreResult<bool>;

    /// Remove the property; returns whether it was present.
    fn delete_property(&self, name: &str) -> StoreResult<bool>;

    /// Whether the property holds a boolean.
    fn is_boolean_property(&self, name: &str) -> StoreResult<bool>;

    /// Whether the property holds a number.
    fn is_number_property(&self, name: &str) -> StoreResult<bool>;

    /// Whether the property holds a string.
    fn is_string_property(&self, name: &str) -> StoreResult<bool>;

    /// Whether the property holds an object or array.
    fn is_object_property(&self, name: &str) -> StoreResult<bool>;

    /// Read a boolean property.
    fn get_boolean_property(&self, name: &str) -> StoreResult<Option<bool>>;

    /// Write a boolean property; `None` stores null.
    fn set_boolean_property(&self, name: &str, value: Option<bool>) -> StoreResult<()>;

    /// Read a number property.
    fn get_number_property(&self, name: &str) -> StoreResult<Option<Number>>;

    /// Write a number property; `None` stores null.
    fn set_number_property(&self, name: &str, value: Option<Number>) -> StoreResult<()>;

    /// Read a string property.
    fn get_string_property(&self, name: &str) -> StoreResult<Option<String>>;

    /// Write a string property; `None` stores null.
    fn set_string_property(&self, name: &str, value: Option<String>) -> StoreResult<()>;

    /// Read a nested object or array.
    fn get_object_property(&self, name: &str) -> StoreResult<Option<StoreHandle>>;

    /// Write a nested object or array; `None` stores null.
    fn set_object_property(&self, name: &str, value: Option<StoreHandle>) -> StoreResult<()>;

    /// Number of elements.
    fn length(&self) -> StoreResult<usize> {
        Err(StoreError::NotAnArray { operation: "length" })
    }

    /// Truncate or pad with nulls to `len` elements.
    fn set_length(&self, _len: usize) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "set_length",
        })
    }

    /// Insert before `index`, shifting later elements up.
    fn insert_element(&self, _index: usize, _value: StoreSlot) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "insert_element",
        })
    }

    /// Insert at the front.
    fn prepend_element(&self, value: StoreSlot) -> StoreResult<()> {
        self.insert_element(0, value)
    }

    /// Insert at the end.
    fn append_element(&self, value: StoreSlot) -> StoreResult<()> {
        let len = self.length()?;
        self.insert_element(len, value)
    }

    /// Remove up to `count` elements starting at `index`.
    fn remove_elements(&self, _index: usize, _count: usize) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "remove_elements",
        })
    }

    /// Whether the element is null or missing.
    fn is_null_element(&self, _index: usize) -> StoreResult<bool> {
        Err(StoreError::NotAnArray {
            operation: "is_null_element",
        })
    }

    /// Whether the element holds a boolean.
    fn is_boolean_element(&self, _index: usize) -> StoreResult<bool> {
        Err(StoreError::NotAnArray {
            operation: "is_boolean_element",
        })
    }

    /// Whether the element holds a number.
    fn is_number_element(&self, _index: usize) -> StoreResult<bool> {
        Err(StoreError::NotAnArray {
            operation: "is_number_element",
        })
    }

    /// Whether the element holds a string.
    fn is_string_element(&self, _index: usize) -> StoreResult<bool> {
        Err(StoreError::NotAnArray {
            operation: "is_string_element",
        })
    }

    /// Whether the element holds an object or array.
    fn is_object_element(&self, _index: usize) -> StoreResult<bool> {
        Err(StoreError::NotAnArray {
            operation: "is_object_element",
        })
    }

    /// Read a boolean element.
    fn get_boolean_element(&self, _index: usize) -> StoreResult<Option<bool>> {
        Err(StoreError::NotAnArray {
            operation: "get_boolean_element",
        })
    }

    /// Write a boolean element.
    fn set_boolean_element(&self, _index: usize, _value: Option<bool>) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "set_boolean_element",
        })
    }

    /// Read a number element.
    fn get_number_element(&self, _index: usize) -> StoreResult<Option<Number>> {
        Err(StoreError::NotAnArray {
            operation: "get_number_element",
        })
    }

    /// Write a number element.
    fn set_number_element(&self, _index: usize, _value: Option<Number>) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "set_number_element",
        })
    }

    /// Read a string element.
    fn get_string_element(&self, _index: usize) -> StoreResult<Option<String>> {
        Err(StoreError::NotAnArray {
            operation: "get_string_element",
        })
    }

    /// Write a string element.
    fn set_string_element(&self, _index: usize, _value: Option<String>) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "set_string_element",
        })
    }

    /// Read a nested object or array element.
    fn get_object_element(&self, _index: usize) -> StoreResult<Option<StoreHandle>> {
        Err(StoreError::NotAnArray {
            operation: "get_object_element",
        })
    }

    /// Write a nested object or array element.
    fn set_object_element(&self, _index: usize, _value: Option<StoreHandle>) -> StoreResult<()> {
        Err(StoreError::NotAnArray {
            operation: "set_object_element",
        })
    }
}
