//! Field type analysis for code generation.

use syn::{Path, Type, TypePath};

/// How a field's value crosses the accessor boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A type implementing `json_shape::Declared`.
    Declared,

    /// Any type, converted by the given adapter.
    Adapted(Path),
}

impl FieldKind {
    /// Analyze a field type.
    ///
    /// Types the store cannot hold are rejected unless an adapter is given,
    /// with a message naming the shape-native alternative.
    pub fn from_type(ty: &Type, adapter: Option<&Path>) -> syn::Result<Self> {
        if let Some(adapter) = adapter {
            return Ok(FieldKind::Adapted(adapter.clone()));
        }
        match unsupported(ty) {
            Some(hint) => Err(syn::Error::new_spanned(ty, hint)),
            None => Ok(FieldKind::Declared),
        }
    }
}

fn last_segment(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(TypePath { qself: None, path }) => {
            path.segments.last().map(|s| s.ident.to_string())
        }
        _ => None,
    }
}

fn unsupported(ty: &Type) -> Option<&'static str> {
    let name = last_segment(ty)?;
    let hint = match name.as_str() {
        "Vec" | "VecDeque" => {
            "Vec is not a shape type; use Option<BooleanArray>, Option<NumberArray>, \
             Option<StringArray> or Option<ObjectArray<T>>, or add #[shape(adapter = \"...\")]"
        }
        "HashMap" | "BTreeMap" => {
            "maps are not shape types; use Option<BooleanMap>, Option<NumberMap>, \
             Option<StringMap> or Option<ObjectMap<T>>, or add #[shape(adapter = \"...\")]"
        }
        "String" => "strings are nullable in a shape; use Option<String>",
        "u8" | "u16" | "u32" | "u64" | "u128" | "usize" | "i128" | "isize" => {
            "the store has no type for this integer; use i8, i16, i32 or i64, \
             or add #[shape(adapter = \"...\")]"
        }
        _ => return None,
    };
    Some(hint)
}
