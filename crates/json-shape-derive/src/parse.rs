//! Parsing logic for the Shape derive macro.

use darling::{ast, FromDeriveInput, FromField};
use syn::{Generics, Ident, Path, Type, Visibility};

/// Parsed struct-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(shape), supports(struct_named))]
pub struct ShapeInput {
    /// The struct identifier.
    pub ident: Ident,

    /// The struct visibility.
    pub vis: Visibility,

    /// Generic parameters; shapes must have none.
    pub generics: Generics,

    /// Struct data (fields).
    pub data: ast::Data<(), FieldInput>,

    /// Schema namespace (e.g., `#[shape(namespace = "geo")]`).
    #[darling(default)]
    pub namespace: Option<String>,

    /// Schema name; defaults to the struct name.
    #[darling(default)]
    pub name: Option<String>,

    /// Parent shape type.
    #[darling(default)]
    pub extends: Option<Path>,
}

impl ShapeInput {
    /// Get the fields as a vector.
    pub fn fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields.to_vec())
            .unwrap_or_default()
    }

    /// The schema name.
    pub fn schema_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(shape))]
pub struct FieldInput {
    /// Field identifier.
    pub ident: Option<Ident>,

    /// Field type.
    pub ty: Type,

    /// Generate a getter.
    #[darling(default)]
    pub get: bool,

    /// Generate a setter.
    #[darling(default)]
    pub set: bool,

    /// Generate a presence check.
    #[darling(default)]
    pub has: bool,

    /// Generate a null check.
    #[darling(default)]
    pub is_null: bool,

    /// Generate a delete.
    #[darling(default)]
    pub delete: bool,

    /// Property key, when it differs from the field name.
    #[darling(default)]
    pub rename: Option<String>,

    /// Adapter converting the field type for storage.
    #[darling(default)]
    pub adapter: Option<Path>,
}

/// Which accessors a field asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operations {
    pub get: bool,
    pub set: bool,
    pub has: bool,
    pub is_null: bool,
    pub delete: bool,
}

impl FieldInput {
    /// Get the field identifier.
    pub fn ident(&self) -> syn::Result<&Ident> {
        self.ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(&self.ty, "shape fields must be named"))
    }

    /// Get the property key for this field.
    pub fn key(&self) -> syn::Result<String> {
        match &self.rename {
            Some(key) => Ok(key.clone()),
            None => Ok(self.ident()?.to_string()),
        }
    }

    /// Requested operations; `get` and `set` when none are named.
    pub fn operations(&self) -> Operations {
        let named = Operations {
            get: self.get,
            set: self.set,
            has: self.has,
            is_null: self.is_null,
            delete: self.delete,
        };
        if named.get || named.set || named.has || named.is_null || named.delete {
            named
        } else {
            Operations {
                get: true,
                set: true,
                ..named
            }
        }
    }
}
