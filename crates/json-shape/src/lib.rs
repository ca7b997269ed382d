//! Typed accessor synthesis over shared JSON-like values.
//!
//! `json-shape` turns a declarative description of a JSON document's shape
//! into a working accessor implementation that reads and writes an
//! underlying store value in place.
//!
//! # Core Concepts
//!
//! - **SchemaDecl**: A namespaced declaration: members annotated with a
//!   property name and an operation (`has`, `is_null`, `delete`, `get`, `set`)
//! - **Schema**: A validated declaration linked to its resolved parent
//! - **Implementation**: The accessor table synthesized for a schema,
//!   sharing inherited accessors with its parent
//! - **ImplementationRegistry**: Computes each implementation at most once
//! - **ShapeFactory**: Binds implementations to new or existing store values
//! - **StoreValue**: The protocol every backing store implements
//!
//! # Lookup Rules
//!
//! ```text
//! lookup(Child, key) = Child.local(key) or lookup(Parent, key)
//! ```
//!
//! - Descriptor keys are unique across a schema and its ancestors
//! - Absent and null properties read as the type's default
//! - Casts succeed only towards the schema itself or an ancestor
//!
//! # Quick Start
//!
//! ```
//! use json_shape::{
//!     Declared, Operation, PropertyValue, SchemaDecl, SchemaRef, ShapeFactory, TypeRef,
//! };
//!
//! # fn main() -> json_shape::ShapeResult<()> {
//! let point = SchemaRef::from(
//!     SchemaDecl::builder("geo", "Point")
//!         .property("x", TypeRef::F64)
//!         .property("y", TypeRef::F64)
//!         .build(),
//! );
//!
//! let factory = ShapeFactory::memory();
//! let p = factory.create_dynamic(&point, None)?;
//! p.invoke(Operation::Set, "x", PropertyValue::F64(1.5))?;
//!
//! let x = f64::from_property(p.invoke(Operation::Get, "x", PropertyValue::Unit)?)?;
//! let y = f64::from_property(p.invoke(Operation::Get, "y", PropertyValue::Unit)?)?;
//! assert_eq!((x, y), (1.5, 0.0));
//! # Ok(())
//! # }
//! ```
//!
//! # Using Typed Handles (with derive macro)
//!
//! ```ignore
//! use json_shape::{Shape, ShapeFactory};
//!
//! #[derive(Shape)]
//! #[shape(namespace = "geo")]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! let point = ShapeFactory::memory().create::<PointRef>()?;
//! point.set_x(3.0)?;
//! assert_eq!(point.x()?, 3.0);
//! ```

mod adapter;
pub mod collections;
mod content;
mod decl;
mod descriptor;
mod error;
mod factory;
mod number;
mod object;
mod registry;
mod resolver;
mod shape;
mod store;
mod synth;
mod value;

// Declarations
pub use decl::{
    MemberDecl, PropertyAttr, SchemaDecl, SchemaDeclBuilder, SchemaId, SchemaRef, TypeRef,
};
pub use descriptor::{MethodKey, NumericKind, Operation, PropertyDescriptor, ValueKind};
pub use error::{SchemaError, ShapeError, ShapeResult, StoreError, StoreResult};
pub use number::Number;

// Adapters and values
pub use adapter::{AdapterKind, AdapterRef, PropertyAdapter};
pub use value::{AdaptedValue, Declared, PropertyValue};

// Resolution and synthesis
pub use registry::ImplementationRegistry;
pub use resolver::{DescriptorSummary, Schema, SchemaSummary};
pub use synth::{Accessor, CustomAccessor, Implementation, Origin, StaticImplementation};

// Instances
pub use collections::builtin;
pub use collections::{
    BooleanArray, BooleanMap, IntegerArray, JsonArray, NumberArray, NumberMap, ObjectArray,
    ObjectMap, StringArray, StringMap,
};
pub use content::{ContentGenerator, ContentHandler, JsonValueBuilder, Primitive};
pub use factory::{ShapeFactory, ShapeFactoryBuilder};
pub use object::ShapeObject;
pub use shape::{Shape, ShapeHandle};

// Backing stores
pub use store::{
    value_type_name, BackingStore, MemoryStore, MemoryValue, StoreHandle, StoreSlot, StoreValue,
};

// Re-export derive macro when feature is enabled
#[cfg(feature = "derive")]
pub use json_shape_derive::Shape;

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
