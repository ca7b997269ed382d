//! Property descriptors.
//!
//! A [`PropertyDescriptor`] is one validated accessor operation: which store
//! key it touches, what it does there and what kind of value crosses the
//! boundary. Descriptors are produced by classifying [`MemberDecl`]s; every
//! signature problem is reported here, at resolution time.

use crate::adapter::{AdapterKind, AdapterRef};
use crate::decl::{MemberDecl, SchemaId, SchemaRef, TypeRef};
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The operation a member performs on its property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Is the key present (possibly null)?
    Has,
    /// Is the key present and null?
    IsNull,
    /// Remove the key.
    Delete,
    /// Read the value.
    Get,
    /// Write the value.
    Set,
}

impl Operation {
    /// Operations that answer with a bool and take nothing.
    pub fn is_predicate(self) -> bool {
        matches!(self, Operation::Has | Operation::IsNull | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Has => "has",
            Operation::IsNull => "is_null",
            Operation::Delete => "delete",
            Operation::Get => "get",
            Operation::Set => "set",
        })
    }
}

/// Lookup key of an accessor: operation plus property name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodKey {
    /// The operation.
    pub operation: Operation,
    /// The property name.
    pub name: String,
}

impl MethodKey {
    /// Create a key.
    pub fn new(operation: Operation, name: impl Into<String>) -> Self {
        Self {
            operation,
            name: name.into(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation, self.name)
    }
}

/// Width of an unboxed number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

/// The kind of value a descriptor moves across the store boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    /// Unboxed `bool`; null reads as `false`.
    BooleanPrimitive,
    /// Unboxed number; null reads as zero.
    NumberPrimitive(NumericKind),
    /// `char` stored as a one-character string.
    CharacterPrimitive,
    /// Nullable boolean.
    Boolean,
    /// Nullable number.
    Number,
    /// Nullable string.
    String,
    /// Nested object bound to a target schema.
    ObjectRef(SchemaRef),
    /// Array container with an element schema.
    ArrayRef(SchemaRef),
    /// Map container with an element schema.
    MapRef(SchemaRef),
}

impl ValueKind {
    fn from_type(ty: &TypeRef) -> Option<Self> {
        Some(match ty {
            TypeRef::Bool => ValueKind::BooleanPrimitive,
            TypeRef::I8 => ValueKind::NumberPrimitive(NumericKind::I8),
            TypeRef::I16 => ValueKind::NumberPrimitive(NumericKind::I16),
            TypeRef::I32 => ValueKind::NumberPrimitive(NumericKind::I32),
            TypeRef::I64 => ValueKind::NumberPrimitive(NumericKind::I64),
            TypeRef::F32 => ValueKind::NumberPrimitive(NumericKind::F32),
            TypeRef::F64 => ValueKind::NumberPrimitive(NumericKind::F64),
            TypeRef::Char => ValueKind::CharacterPrimitive,
            TypeRef::Boolean => ValueKind::Boolean,
            TypeRef::Number => ValueKind::Number,
            TypeRef::String => ValueKind::String,
            TypeRef::Object(target) => ValueKind::ObjectRef(target.clone()),
            TypeRef::ObjectArray(element) => ValueKind::ArrayRef(element.clone()),
            TypeRef::ObjectMap(element) => ValueKind::MapRef(element.clone()),
            TypeRef::Foreign { .. } => return None,
        })
    }

    /// Short name used in summaries.
    pub fn label(&self) -> String {
        match self {
            ValueKind::BooleanPrimitive => "bool".into(),
            ValueKind::NumberPrimitive(kind) => format!("{kind:?}").to_lowercase(),
            ValueKind::CharacterPrimitive => "char".into(),
            ValueKind::Boolean => "boolean".into(),
            ValueKind::Number => "number".into(),
            ValueKind::String => "string".into(),
            ValueKind::ObjectRef(s) => format!("object<{}>", s.id()),
            ValueKind::ArrayRef(s) => format!("array<{}>", s.id()),
            ValueKind::MapRef(s) => format!("map<{}>", s.id()),
        }
    }
}

/// One declared accessor operation.
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    /// Property key in the store.
    pub name: String,
    /// Declaring member, for diagnostics.
    pub method: String,
    /// The operation.
    pub operation: Operation,
    /// Kind of the value read or written; `None` for predicates.
    pub value_kind: Option<ValueKind>,
    /// Optional adapter; when set, `value_kind` is its property kind.
    pub adapter: Option<AdapterRef>,
}

impl PropertyDescriptor {
    /// Lookup key of this descriptor.
    pub fn key(&self) -> MethodKey {
        MethodKey::new(self.operation, self.name.clone())
    }

    /// Classify a member of `schema` into a descriptor.
    pub fn classify(schema: &SchemaId, member: &MemberDecl) -> Result<Self, SchemaError> {
        let method = member.method();
        let invalid = |reason: &str| SchemaError::invalid_signature(schema, method, reason);

        let attr = member
            .property_attr()
            .ok_or_else(|| invalid("member is not annotated with a property operation"))?;
        if attr.name.is_empty() {
            return Err(invalid("property name must not be empty"));
        }

        let declared = match attr.operation {
            op if op.is_predicate() => {
                if !member.params().is_empty() {
                    return Err(invalid(&format!("{op} accessor must have no parameters")));
                }
                if member.result() != Some(&TypeRef::Bool) {
                    return Err(invalid(&format!("{op} accessor must return bool")));
                }
                if attr.adapter.is_some() {
                    return Err(invalid("an adapter is only valid on get and set accessors"));
                }
                None
            }
            Operation::Get => {
                if !member.params().is_empty() {
                    return Err(invalid("get accessor must have no parameters"));
                }
                Some(
                    member
                        .result()
                        .ok_or_else(|| invalid("get accessor must declare a result type"))?,
                )
            }
            _ => {
                if member.result().is_some() {
                    return Err(invalid("set accessor must not declare a result type"));
                }
                match member.params() {
                    [ty] => Some(ty),
                    params => {
                        return Err(invalid(&format!(
                            "set accessor must have exactly one parameter, found {}",
                            params.len()
                        )))
                    }
                }
            }
        };

        let value_kind = match (declared, &attr.adapter) {
            (None, _) => None,
            (Some(ty), Some(adapter)) => Some(adapted_kind(schema, method, ty, adapter)?),
            (Some(ty), None) => Some(ValueKind::from_type(ty).ok_or_else(|| {
                invalid(&format!(
                    "type {} is not a store type and needs an adapter",
                    ty.describe()
                ))
            })?),
        };

        Ok(Self {
            name: attr.name.clone(),
            method: method.to_string(),
            operation: attr.operation,
            value_kind,
            adapter: attr.adapter.clone(),
        })
    }
}

fn adapted_kind(
    schema: &SchemaId,
    method: &str,
    declared: &TypeRef,
    adapter: &AdapterRef,
) -> Result<ValueKind, SchemaError> {
    match declared.value_type_id() {
        Some(id) if id == adapter.value_type_id() => {}
        Some(_) => {
            return Err(SchemaError::invalid_signature(
                schema,
                method,
                format!(
                    "declared type {} does not match adapter value type {}",
                    declared.describe(),
                    adapter.value_type_name()
                ),
            ))
        }
        None => {
            return Err(SchemaError::invalid_signature(
                schema,
                method,
                format!(
                    "adapted accessor must declare its value type {} with TypeRef::foreign",
                    adapter.value_type_name()
                ),
            ))
        }
    }

    match adapter.property_kind() {
        AdapterKind::Boolean => Ok(ValueKind::Boolean),
        AdapterKind::Number => Ok(ValueKind::Number),
        AdapterKind::String => Ok(ValueKind::String),
        AdapterKind::Object(target) => Ok(ValueKind::ObjectRef(target)),
        AdapterKind::Unsupported(property_type) => Err(SchemaError::UnsupportedAdapterKind {
            schema: schema.clone(),
            member: method.to_string(),
            adapter: adapter.name(),
            property_type,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PropertyAdapter;
    use crate::collections::builtin;

    fn schema() -> SchemaId {
        SchemaId::new("test", "Sample")
    }

    fn reason(err: SchemaError) -> String {
        match err {
            SchemaError::InvalidSignature { reason, .. } => reason,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Default)]
    struct Upper;

    impl PropertyAdapter for Upper {
        type Value = Vec<u8>;
        type Property = String;

        fn to_property(&self, value: Vec<u8>) -> Option<String> {
            String::from_utf8(value).ok()
        }

        fn from_property(&self, property: Option<String>) -> Vec<u8> {
            property.map(String::into_bytes).unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct Bytes;

    impl PropertyAdapter for Bytes {
        type Value = String;
        type Property = Vec<u8>;

        fn to_property(&self, value: String) -> Option<Vec<u8>> {
            Some(value.into_bytes())
        }

        fn from_property(&self, property: Option<Vec<u8>>) -> String {
            String::from_utf8(property.unwrap_or_default()).unwrap_or_default()
        }
    }

    #[test]
    fn test_classify_getter_and_setter() {
        let get = PropertyDescriptor::classify(
            &schema(),
            &MemberDecl::getter("count", "count", TypeRef::I32),
        )
        .unwrap();
        assert_eq!(get.operation, Operation::Get);
        assert_eq!(
            get.value_kind,
            Some(ValueKind::NumberPrimitive(NumericKind::I32))
        );

        let set = PropertyDescriptor::classify(
            &schema(),
            &MemberDecl::setter("set_label", "label", TypeRef::String),
        )
        .unwrap();
        assert_eq!(set.key(), MethodKey::new(Operation::Set, "label"));
        assert_eq!(set.value_kind, Some(ValueKind::String));
    }

    #[test]
    fn test_predicates_carry_no_value_kind() {
        for member in [
            MemberDecl::has("has_x", "x"),
            MemberDecl::is_null("is_x_null", "x"),
            MemberDecl::delete("delete_x", "x"),
        ] {
            let d = PropertyDescriptor::classify(&schema(), &member).unwrap();
            assert!(d.value_kind.is_none());
            assert!(d.operation.is_predicate());
        }
    }

    #[test]
    fn test_unannotated_member_rejected() {
        let err = PropertyDescriptor::classify(&schema(), &MemberDecl::new("helper")).unwrap_err();
        assert!(reason(err).contains("not annotated"));
    }

    #[test]
    fn test_predicate_signature_rules() {
        let with_param = MemberDecl::has("has_x", "x").param(TypeRef::I32);
        assert!(reason(PropertyDescriptor::classify(&schema(), &with_param).unwrap_err())
            .contains("no parameters"));

        let wrong_result = MemberDecl::new("is_x_null")
            .property("x", Operation::IsNull)
            .returns(TypeRef::Boolean);
        assert!(
            reason(PropertyDescriptor::classify(&schema(), &wrong_result).unwrap_err())
                .contains("must return bool")
        );

        let adapted = MemberDecl::delete("delete_x", "x").adapter(AdapterRef::of::<Upper>());
        assert!(reason(PropertyDescriptor::classify(&schema(), &adapted).unwrap_err())
            .contains("only valid on get and set"));
    }

    #[test]
    fn test_setter_signature_rules() {
        let two = MemberDecl::setter("set_x", "x", TypeRef::I32).param(TypeRef::I32);
        assert!(reason(PropertyDescriptor::classify(&schema(), &two).unwrap_err())
            .contains("exactly one parameter, found 2"));

        let returning = MemberDecl::setter("set_x", "x", TypeRef::I32).returns(TypeRef::Bool);
        assert!(reason(PropertyDescriptor::classify(&schema(), &returning).unwrap_err())
            .contains("must not declare a result"));

        let getter_without_result = MemberDecl::new("x").property("x", Operation::Get);
        assert!(
            reason(PropertyDescriptor::classify(&schema(), &getter_without_result).unwrap_err())
                .contains("must declare a result")
        );
    }

    #[test]
    fn test_foreign_type_needs_adapter() {
        let member = MemberDecl::getter("raw", "raw", TypeRef::foreign::<Vec<u8>>());
        assert!(reason(PropertyDescriptor::classify(&schema(), &member).unwrap_err())
            .contains("needs an adapter"));

        let adapted = member.adapter(AdapterRef::of::<Upper>());
        let d = PropertyDescriptor::classify(&schema(), &adapted).unwrap();
        assert_eq!(d.value_kind, Some(ValueKind::String));
        assert!(d.adapter.is_some());
    }

    #[test]
    fn test_adapter_value_type_must_match() {
        let member = MemberDecl::getter("raw", "raw", TypeRef::foreign::<String>())
            .adapter(AdapterRef::of::<Upper>());
        assert!(reason(PropertyDescriptor::classify(&schema(), &member).unwrap_err())
            .contains("does not match adapter value type"));
    }

    #[test]
    fn test_adapter_checked_against_builtin_types() {
        let member =
            MemberDecl::getter("raw", "raw", TypeRef::I32).adapter(AdapterRef::of::<Upper>());
        assert!(reason(PropertyDescriptor::classify(&schema(), &member).unwrap_err())
            .contains("declared type i32 does not match"));

        let object = TypeRef::Object(builtin::json_object_ref());
        let member = MemberDecl::getter("raw", "raw", object).adapter(AdapterRef::of::<Upper>());
        assert!(reason(PropertyDescriptor::classify(&schema(), &member).unwrap_err())
            .contains("TypeRef::foreign"));
    }

    #[test]
    fn test_unsupported_adapter_kind() {
        let member = MemberDecl::getter("text", "text", TypeRef::foreign::<String>())
            .adapter(AdapterRef::of::<Bytes>());
        let err = PropertyDescriptor::classify(&schema(), &member).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedAdapterKind { .. }));
    }
}
