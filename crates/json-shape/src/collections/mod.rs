//! Container shapes.
//!
//! Arrays and maps are ordinary schemas descending from the built-in root.
//! Object containers carry an element schema so their elements come back
//! bound to the right implementation.

pub mod builtin;

mod array;
mod map;

pub use array::{BooleanArray, IntegerArray, JsonArray, NumberArray, ObjectArray, StringArray};
pub use map::{BooleanMap, NumberMap, ObjectMap, StringMap};
