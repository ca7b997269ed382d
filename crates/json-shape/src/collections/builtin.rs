//! Built-in schema declarations.
//!
//! These schemas have hand-written implementations and are registered as
//! static in every [`ImplementationRegistry`](crate::ImplementationRegistry).
//! `JsonObject` is the root of every hierarchy.

use crate::decl::{SchemaDecl, SchemaRef};
use std::sync::{Arc, OnceLock};

/// Namespace of the built-in schemas.
pub const NAMESPACE: &str = "json_shape";

macro_rules! builtin {
    ($(#[$doc:meta])* $decl:ident, $reference:ident, $name:literal $(, $parent:ident)?) => {
        $(#[$doc])*
        pub fn $decl() -> Arc<SchemaDecl> {
            static DECL: OnceLock<Arc<SchemaDecl>> = OnceLock::new();
            DECL.get_or_init(|| {
                SchemaDecl::builder(NAMESPACE, $name)
                    $(.extends(SchemaRef::lazy($parent)))?
                    .build()
            })
            .clone()
        }

        #[doc = concat!("Reference to `", $name, "`.")]
        pub fn $reference() -> SchemaRef {
            SchemaRef::lazy($decl)
        }
    };
}

builtin!(
    /// The root object schema.
    json_object, json_object_ref, "JsonObject"
);
builtin!(
    /// Untyped array; ancestor of every array schema.
    json_array, json_array_ref, "JsonArray", json_object
);
builtin!(
    /// Array of nullable booleans.
    boolean_array, boolean_array_ref, "BooleanArray", json_array
);
builtin!(
    /// Array of nullable numbers.
    number_array, number_array_ref, "NumberArray", json_array
);
builtin!(
    /// Array of integers; null elements read as zero.
    integer_array, integer_array_ref, "IntegerArray", json_array
);
builtin!(
    /// Array of nullable strings.
    string_array, string_array_ref, "StringArray", json_array
);
builtin!(
    /// Array of objects bound to an element schema.
    object_array, object_array_ref, "ObjectArray", json_array
);
builtin!(
    /// Map of nullable booleans.
    boolean_map, boolean_map_ref, "BooleanMap", json_object
);
builtin!(
    /// Map of nullable numbers.
    number_map, number_map_ref, "NumberMap", json_object
);
builtin!(
    /// Map of nullable strings.
    string_map, string_map_ref, "StringMap", json_object
);
builtin!(
    /// Map of objects bound to an element schema.
    object_map, object_map_ref, "ObjectMap", json_object
);

/// Every built-in declaration, root first.
pub fn all() -> [Arc<SchemaDecl>; 11] {
    [
        json_object(),
        json_array(),
        boolean_array(),
        number_array(),
        integer_array(),
        string_array(),
        object_array(),
        boolean_map(),
        number_map(),
        string_map(),
        object_map(),
    ]
}
