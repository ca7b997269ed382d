//! Derive macro for the json-shape `Shape` trait.
//!
//! This crate provides the `#[derive(Shape)]` macro that generates:
//! - `{Name}Ref`: Typed handle with one method per declared accessor
//! - `impl Shape for {Name}`: The schema declaration, built once
//!
//! # Usage
//!
//! ```ignore
//! use json_shape::Shape;
//!
//! #[derive(Shape)]
//! #[shape(namespace = "zoo")]
//! struct Animal {
//!     name: Option<String>,
//!     legs: i32,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod field_kind;
mod parse;

/// Derive the `Shape` trait for a marker struct.
///
/// The struct's fields are never stored; they declare the properties of
/// the shape. This macro generates:
/// - A handle type `{StructName}Ref` that derefs to its parent's handle
///   (`ShapeObject` at the root)
/// - `impl Shape for {StructName}`
///
/// # Attributes
///
/// ## Struct Attributes
///
/// - `#[shape(namespace = "ns")]`: Required namespace of the schema
/// - `#[shape(name = "Name")]`: Schema name, defaults to the struct name
/// - `#[shape(extends = "Parent")]`: Parent shape type
///
/// ## Field Attributes
///
/// - `#[shape(get, set, has, is_null, delete)]`: Accessors to generate;
///   `get` and `set` when none are listed
/// - `#[shape(rename = "key")]`: Use a different property key
/// - `#[shape(adapter = "Adapter")]`: Convert the field type with a
///   `PropertyAdapter`
///
/// # Examples
///
/// ```ignore
/// use json_shape::{Shape, ShapeFactory};
///
/// #[derive(Shape)]
/// #[shape(namespace = "zoo", extends = "Animal")]
/// struct Dog {
///     #[shape(get, set, has)]
///     good: bool,
///     #[shape(rename = "tag_id")]
///     tag: Option<String>,
/// }
///
/// let dog = ShapeFactory::memory().create::<DogRef>()?;
/// dog.set_legs(4)?;
/// dog.set_good(true)?;
/// assert!(dog.has_good()?);
/// ```
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
