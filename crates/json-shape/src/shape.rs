//! Shape traits for typed access.
//!
//! The `Shape` trait ties a declaration to its typed handle. It is typically
//! implemented via the derive macro `#[derive(Shape)]`.

use crate::decl::{SchemaDecl, SchemaRef, TypeRef};
use crate::object::ShapeObject;
use std::sync::Arc;

/// Types that declare a schema and name a typed handle for it.
///
/// # Example
///
/// ```ignore
/// use json_shape::{Shape, ShapeFactory};
///
/// #[derive(Shape)]
/// #[shape(namespace = "geo")]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// let factory = ShapeFactory::memory();
/// let point = factory.create::<PointRef>()?;
/// point.set_x(1.5)?;
/// assert_eq!(point.x()?, 1.5);
/// ```
pub trait Shape: 'static {
    /// The typed handle.
    type Ref: ShapeHandle;

    /// The schema declaration, built once and shared.
    fn declaration() -> Arc<SchemaDecl>;
}

/// A typed view over a [`ShapeObject`].
///
/// Handles own nothing but the object they wrap; cloning one clones the
/// reference, never the stored value.
pub trait ShapeHandle: Clone + Send + Sync + Sized + 'static {
    /// The schema this handle views objects through.
    fn schema() -> SchemaRef;

    /// Wrap an object already bound to [`schema`](Self::schema) or a descendant.
    #[doc(hidden)]
    fn from_object(object: ShapeObject) -> Self;

    /// The wrapped object.
    fn as_object(&self) -> &ShapeObject;

    /// Unwrap into the object.
    fn into_object(self) -> ShapeObject;

    /// How accessors returning this handle are declared.
    fn type_ref() -> TypeRef {
        TypeRef::Object(Self::schema())
    }
}
