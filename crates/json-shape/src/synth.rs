//! Accessor synthesis.
//!
//! For every local descriptor of a resolved [`Schema`] the synthesizer picks
//! one [`Accessor`]: the store call to make and the conversions around it.
//! Inherited descriptors are never synthesized again; lookups fall through
//! to the parent [`Implementation`], so a child shares its ancestors'
//! accessors by pointer.

use crate::adapter::{AdapterKind, AdapterRef};
use crate::collections::builtin;
use crate::decl::{SchemaId, SchemaRef};
use crate::descriptor::{MethodKey, NumericKind, Operation, PropertyDescriptor, ValueKind};
use crate::error::{SchemaError, ShapeError, ShapeResult};
use crate::number::Number;
use crate::object::ShapeObject;
use crate::resolver::Schema;
use crate::value::PropertyValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Body of a hand-written accessor.
pub type CustomAccessor =
    Arc<dyn Fn(&ShapeObject, PropertyValue) -> ShapeResult<PropertyValue> + Send + Sync>;

/// One synthesized accessor body.
pub enum Accessor {
    /// `has_property`.
    Has(String),
    /// `is_null_property`.
    IsNull(String),
    /// `delete_property`.
    Delete(String),
    /// Unboxed `bool`; null reads as `false`.
    GetBool(String),
    /// Unboxed `bool` write.
    SetBool(String),
    /// Unboxed number; null reads as zero.
    GetNumeric {
        /// Property key.
        name: String,
        /// Target width.
        kind: NumericKind,
    },
    /// Unboxed number write.
    SetNumeric {
        /// Property key.
        name: String,
        /// Source width.
        kind: NumericKind,
    },
    /// `char` from the first character of a string; `'\0'` when absent.
    GetChar(String),
    /// `char` written as a one-character string.
    SetChar(String),
    /// Nullable boolean passthrough.
    GetBoolean(String),
    /// Nullable boolean write.
    SetBoolean(String),
    /// Nullable number passthrough.
    GetNumber(String),
    /// Nullable number write.
    SetNumber(String),
    /// Nullable string passthrough.
    GetString(String),
    /// Nullable string write.
    SetString(String),
    /// Store read followed by the adapter's `from_property`.
    GetAdapted {
        /// Property key.
        name: String,
        /// The adapter.
        adapter: AdapterRef,
        /// The adapter's store kind.
        kind: ValueKind,
    },
    /// Adapter's `to_property` followed by a store write.
    SetAdapted {
        /// Property key.
        name: String,
        /// The adapter.
        adapter: AdapterRef,
        /// The adapter's store kind.
        kind: ValueKind,
    },
    /// Nested object bound to `target`.
    GetObject {
        /// Property key.
        name: String,
        /// Schema the nested object is bound to.
        target: SchemaRef,
    },
    /// Nested object, array or map write.
    SetObject(String),
    /// Container bound to `container`, then narrowed to `element`.
    GetContainer {
        /// Property key.
        name: String,
        /// Built-in container schema.
        container: SchemaRef,
        /// Element schema.
        element: SchemaRef,
    },
    /// Hand-written body.
    Custom(CustomAccessor),
}

impl Accessor {
    /// Pick the accessor for one descriptor.
    pub fn plan(schema: &SchemaId, descriptor: &PropertyDescriptor) -> Result<Self, SchemaError> {
        let name = descriptor.name.clone();
        let missing_kind = || {
            SchemaError::invalid_signature(schema, &descriptor.method, "accessor has no value kind")
        };

        let accessor = match descriptor.operation {
            Operation::Has => Accessor::Has(name),
            Operation::IsNull => Accessor::IsNull(name),
            Operation::Delete => Accessor::Delete(name),
            op => {
                let kind = descriptor.value_kind.clone().ok_or_else(missing_kind)?;
                let get = op == Operation::Get;
                if let Some(adapter) = &descriptor.adapter {
                    if let AdapterKind::Unsupported(property_type) = adapter.property_kind() {
                        return Err(SchemaError::UnsupportedAdapterKind {
                            schema: schema.clone(),
                            member: descriptor.method.clone(),
                            adapter: adapter.name(),
                            property_type,
                        });
                    }
                    let adapter = adapter.clone();
                    return Ok(if get {
                        Accessor::GetAdapted {
                            name,
                            adapter,
                            kind,
                        }
                    } else {
                        Accessor::SetAdapted {
                            name,
                            adapter,
                            kind,
                        }
                    });
                }
                match (kind, get) {
                    (ValueKind::BooleanPrimitive, true) => Accessor::GetBool(name),
                    (ValueKind::BooleanPrimitive, false) => Accessor::SetBool(name),
                    (ValueKind::NumberPrimitive(kind), true) => Accessor::GetNumeric { name, kind },
                    (ValueKind::NumberPrimitive(kind), false) => Accessor::SetNumeric { name, kind },
                    (ValueKind::CharacterPrimitive, true) => Accessor::GetChar(name),
                    (ValueKind::CharacterPrimitive, false) => Accessor::SetChar(name),
                    (ValueKind::Boolean, true) => Accessor::GetBoolean(name),
                    (ValueKind::Boolean, false) => Accessor::SetBoolean(name),
                    (ValueKind::Number, true) => Accessor::GetNumber(name),
                    (ValueKind::Number, false) => Accessor::SetNumber(name),
                    (ValueKind::String, true) => Accessor::GetString(name),
                    (ValueKind::String, false) => Accessor::SetString(name),
                    (ValueKind::ObjectRef(target), true) => Accessor::GetObject { name, target },
                    (ValueKind::ArrayRef(element), true) => Accessor::GetContainer {
                        name,
                        container: builtin::object_array_ref(),
                        element,
                    },
                    (ValueKind::MapRef(element), true) => Accessor::GetContainer {
                        name,
                        container: builtin::object_map_ref(),
                        element,
                    },
                    (ValueKind::ObjectRef(_) | ValueKind::ArrayRef(_) | ValueKind::MapRef(_), false) => {
                        Accessor::SetObject(name)
                    }
                }
            }
        };
        Ok(accessor)
    }

    /// Run the accessor against `object`.
    pub fn invoke(&self, object: &ShapeObject, arg: PropertyValue) -> ShapeResult<PropertyValue> {
        if self.is_getter() && !matches!(arg, PropertyValue::Unit) {
            return Err(ShapeError::value_mismatch("unit", arg.kind_name()));
        }

        match self {
            Accessor::Custom(body) => body(object, arg),
            Accessor::Has(name) => object.has_property(name).map(PropertyValue::Bool),
            Accessor::IsNull(name) => object.is_null_property(name).map(PropertyValue::Bool),
            Accessor::Delete(name) => object.delete_property(name).map(PropertyValue::Bool),
            Accessor::GetBool(name) => Ok(PropertyValue::Bool(
                object.get_boolean_property(name)?.unwrap_or(false),
            )),
            Accessor::SetBool(name) => match arg {
                PropertyValue::Bool(v) => unit(object.set_boolean_property(name, Some(v))),
                other => Err(ShapeError::value_mismatch("bool", other.kind_name())),
            },
            Accessor::GetNumeric { name, kind } => {
                Ok(unbox(*kind, object.get_number_property(name)?))
            }
            Accessor::SetNumeric { name, kind } => {
                let number = boxed(*kind, arg)?;
                unit(object.set_number_property(name, Some(number)))
            }
            Accessor::GetChar(name) => {
                let c = object
                    .get_string_property(name)?
                    .and_then(|s| s.chars().next())
                    .unwrap_or('\0');
                Ok(PropertyValue::Char(c))
            }
            Accessor::SetChar(name) => match arg {
                PropertyValue::Char(c) => unit(object.set_string_property(name, Some(c.to_string()))),
                other => Err(ShapeError::value_mismatch("char", other.kind_name())),
            },
            Accessor::GetBoolean(name)
            | Accessor::GetNumber(name)
            | Accessor::GetString(name) => read(object, name, self.store_kind()),
            Accessor::SetBoolean(name)
            | Accessor::SetNumber(name)
            | Accessor::SetString(name) => write(object, name, self.store_kind(), arg),
            Accessor::GetAdapted {
                name,
                adapter,
                kind,
            } => {
                let raw = read(object, name, kind)?;
                Ok(PropertyValue::Adapted(adapter.from_store(raw)?))
            }
            Accessor::SetAdapted {
                name,
                adapter,
                kind,
            } => match arg {
                PropertyValue::Adapted(value) => write(object, name, kind, adapter.to_store(value)?),
                other => Err(ShapeError::value_mismatch(
                    adapter.value_type_name(),
                    other.kind_name(),
                )),
            },
            Accessor::GetObject { name, target } => object
                .get_object_property(name, target)
                .map(PropertyValue::Object),
            Accessor::SetObject(name) => match arg {
                PropertyValue::Object(v) => unit(object.set_object_property(name, v.as_ref())),
                other => Err(ShapeError::value_mismatch("object", other.kind_name())),
            },
            Accessor::GetContainer {
                name,
                container,
                element,
            } => {
                let bound = match object.get_object_property(name, container)? {
                    Some(c) => Some(c.cast_element(element)?),
                    None => None,
                };
                Ok(PropertyValue::Object(bound))
            }
        }
    }

    fn is_getter(&self) -> bool {
        matches!(
            self,
            Accessor::Has(_)
                | Accessor::IsNull(_)
                | Accessor::Delete(_)
                | Accessor::GetBool(_)
                | Accessor::GetNumeric { .. }
                | Accessor::GetChar(_)
                | Accessor::GetBoolean(_)
                | Accessor::GetNumber(_)
                | Accessor::GetString(_)
                | Accessor::GetAdapted { .. }
                | Accessor::GetObject { .. }
                | Accessor::GetContainer { .. }
        )
    }

    fn store_kind(&self) -> &'static ValueKind {
        match self {
            Accessor::GetBoolean(_) | Accessor::SetBoolean(_) => &ValueKind::Boolean,
            Accessor::GetNumber(_) | Accessor::SetNumber(_) => &ValueKind::Number,
            _ => &ValueKind::String,
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Has(n) => f.debug_tuple("Has").field(n).finish(),
            Accessor::IsNull(n) => f.debug_tuple("IsNull").field(n).finish(),
            Accessor::Delete(n) => f.debug_tuple("Delete").field(n).finish(),
            Accessor::GetBool(n) => f.debug_tuple("GetBool").field(n).finish(),
            Accessor::SetBool(n) => f.debug_tuple("SetBool").field(n).finish(),
            Accessor::GetNumeric { name, kind } => {
                f.debug_tuple("GetNumeric").field(name).field(kind).finish()
            }
            Accessor::SetNumeric { name, kind } => {
                f.debug_tuple("SetNumeric").field(name).field(kind).finish()
            }
            Accessor::GetChar(n) => f.debug_tuple("GetChar").field(n).finish(),
            Accessor::SetChar(n) => f.debug_tuple("SetChar").field(n).finish(),
            Accessor::GetBoolean(n) => f.debug_tuple("GetBoolean").field(n).finish(),
            Accessor::SetBoolean(n) => f.debug_tuple("SetBoolean").field(n).finish(),
            Accessor::GetNumber(n) => f.debug_tuple("GetNumber").field(n).finish(),
            Accessor::SetNumber(n) => f.debug_tuple("SetNumber").field(n).finish(),
            Accessor::GetString(n) => f.debug_tuple("GetString").field(n).finish(),
            Accessor::SetString(n) => f.debug_tuple("SetString").field(n).finish(),
            Accessor::GetAdapted { name, adapter, .. } => {
                f.debug_tuple("GetAdapted").field(name).field(adapter).finish()
            }
            Accessor::SetAdapted { name, adapter, .. } => {
                f.debug_tuple("SetAdapted").field(name).field(adapter).finish()
            }
            Accessor::GetObject { name, target } => {
                f.debug_tuple("GetObject").field(name).field(target).finish()
            }
            Accessor::SetObject(n) => f.debug_tuple("SetObject").field(n).finish(),
            Accessor::GetContainer { name, element, .. } => {
                f.debug_tuple("GetContainer").field(name).field(element).finish()
            }
            Accessor::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn unit(result: ShapeResult<()>) -> ShapeResult<PropertyValue> {
    result.map(|()| PropertyValue::Unit)
}

fn unbox(kind: NumericKind, number: Option<Number>) -> PropertyValue {
    let n = number.unwrap_or(Number::Int(0));
    match kind {
        NumericKind::I8 => PropertyValue::I8(n.as_i64() as i8),
        NumericKind::I16 => PropertyValue::I16(n.as_i64() as i16),
        NumericKind::I32 => PropertyValue::I32(n.as_i64() as i32),
        NumericKind::I64 => PropertyValue::I64(n.as_i64()),
        NumericKind::F32 => PropertyValue::F32(n.as_f64() as f32),
        NumericKind::F64 => PropertyValue::F64(n.as_f64()),
    }
}

fn boxed(kind: NumericKind, arg: PropertyValue) -> ShapeResult<Number> {
    match (kind, arg) {
        (NumericKind::I8, PropertyValue::I8(v)) => Ok(v.into()),
        (NumericKind::I16, PropertyValue::I16(v)) => Ok(v.into()),
        (NumericKind::I32, PropertyValue::I32(v)) => Ok(v.into()),
        (NumericKind::I64, PropertyValue::I64(v)) => Ok(v.into()),
        (NumericKind::F32, PropertyValue::F32(v)) => Ok(v.into()),
        (NumericKind::F64, PropertyValue::F64(v)) => Ok(v.into()),
        (kind, other) => Err(ShapeError::value_mismatch(
            numeric_name(kind),
            other.kind_name(),
        )),
    }
}

fn numeric_name(kind: NumericKind) -> &'static str {
    match kind {
        NumericKind::I8 => "i8",
        NumericKind::I16 => "i16",
        NumericKind::I32 => "i32",
        NumericKind::I64 => "i64",
        NumericKind::F32 => "f32",
        NumericKind::F64 => "f64",
    }
}

fn read(object: &ShapeObject, name: &str, kind: &ValueKind) -> ShapeResult<PropertyValue> {
    Ok(match kind {
        ValueKind::Boolean => PropertyValue::Boolean(object.get_boolean_property(name)?),
        ValueKind::Number => PropertyValue::Number(object.get_number_property(name)?),
        ValueKind::String => PropertyValue::String(object.get_string_property(name)?),
        ValueKind::ObjectRef(target) => {
            PropertyValue::Object(object.get_object_property(name, target)?)
        }
        other => {
            return Err(ShapeError::value_mismatch(
                "store value kind",
                static_label(other),
            ))
        }
    })
}

fn write(
    object: &ShapeObject,
    name: &str,
    kind: &ValueKind,
    value: PropertyValue,
) -> ShapeResult<PropertyValue> {
    match (kind, value) {
        (ValueKind::Boolean, PropertyValue::Boolean(v)) => {
            unit(object.set_boolean_property(name, v))
        }
        (ValueKind::Number, PropertyValue::Number(v)) => unit(object.set_number_property(name, v)),
        (ValueKind::String, PropertyValue::String(v)) => unit(object.set_string_property(name, v)),
        (ValueKind::ObjectRef(_), PropertyValue::Object(v)) => {
            unit(object.set_object_property(name, v.as_ref()))
        }
        (kind, other) => Err(ShapeError::value_mismatch(
            static_label(kind),
            other.kind_name(),
        )),
    }
}

fn static_label(kind: &ValueKind) -> &'static str {
    match kind {
        ValueKind::BooleanPrimitive => "bool",
        ValueKind::NumberPrimitive(k) => numeric_name(*k),
        ValueKind::CharacterPrimitive => "char",
        ValueKind::Boolean => "boolean",
        ValueKind::Number => "number",
        ValueKind::String => "string",
        ValueKind::ObjectRef(_) | ValueKind::ArrayRef(_) | ValueKind::MapRef(_) => "object",
    }
}

/// Hand-written accessors for one schema.
///
/// Registered with
/// [`ImplementationRegistry::register_static`](crate::ImplementationRegistry::register_static),
/// it replaces synthesis for that schema only.
#[derive(Clone, Default)]
pub struct StaticImplementation {
    accessors: HashMap<MethodKey, CustomAccessor>,
}

impl StaticImplementation {
    /// An implementation with no accessors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide the body for `operation` on property `name`.
    pub fn accessor<F>(mut self, operation: Operation, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&ShapeObject, PropertyValue) -> ShapeResult<PropertyValue> + Send + Sync + 'static,
    {
        self.accessors
            .insert(MethodKey::new(operation, name), Arc::new(body));
        self
    }
}

impl fmt::Debug for StaticImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticImplementation")
            .field("accessors", &self.accessors.len())
            .finish()
    }
}

/// How an implementation came to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Built by the synthesizer.
    Synthesized,
    /// Registered by hand.
    Static,
}

/// The accessor table of one schema.
pub struct Implementation {
    schema: Arc<Schema>,
    parent: Option<Arc<Implementation>>,
    accessors: HashMap<MethodKey, Arc<Accessor>>,
    origin: Origin,
}

impl Implementation {
    /// The resolved schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The schema identity.
    pub fn id(&self) -> &SchemaId {
        self.schema.id()
    }

    /// The parent implementation, `None` only for the root.
    pub fn parent(&self) -> Option<&Arc<Implementation>> {
        self.parent.as_ref()
    }

    /// How this implementation was built.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Find the accessor for `key` here or in an ancestor.
    pub fn accessor(&self, key: &MethodKey) -> Option<&Arc<Accessor>> {
        self.accessors
            .get(key)
            .or_else(|| self.parent.as_ref().and_then(|p| p.accessor(key)))
    }

    /// Accessors created for this schema alone.
    pub fn local_accessors(&self) -> impl Iterator<Item = (&MethodKey, &Arc<Accessor>)> {
        self.accessors.iter()
    }

    /// Number of accessors created for this schema alone.
    pub fn local_len(&self) -> usize {
        self.accessors.len()
    }

    /// Whether `id` is this schema or one of its ancestors.
    pub fn descends_from(&self, id: &SchemaId) -> bool {
        self.schema.is_descendant_of(id)
    }

    /// Whether instances are arrays.
    pub fn is_array(&self) -> bool {
        self.descends_from(&builtin::json_array().id())
    }

    pub(crate) fn from_static(
        schema: Arc<Schema>,
        parent: Option<Arc<Implementation>>,
        implementation: &StaticImplementation,
    ) -> Result<Self, SchemaError> {
        let mut accessors = HashMap::with_capacity(schema.local_descriptors().len());
        for descriptor in schema.local_descriptors() {
            let key = descriptor.key();
            let body = implementation.accessors.get(&key).ok_or_else(|| {
                SchemaError::invalid_signature(
                    schema.id(),
                    &descriptor.method,
                    "hand-written implementation provides no accessor for this member",
                )
            })?;
            accessors.insert(key, Arc::new(Accessor::Custom(body.clone())));
        }
        if let Some(extra) = implementation
            .accessors
            .keys()
            .find(|key| !accessors.contains_key(*key))
        {
            return Err(SchemaError::invalid_signature(
                schema.id(),
                extra.to_string(),
                "hand-written accessor matches no declared member",
            ));
        }

        Ok(Self {
            schema,
            parent,
            accessors,
            origin: Origin::Static,
        })
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("schema", self.id())
            .field("parent", &self.parent.as_ref().map(|p| p.id()))
            .field("accessors", &self.accessors.len())
            .field("origin", &self.origin)
            .finish()
    }
}

/// Build the implementation of `schema` on top of `parent`.
///
/// Only local descriptors get accessors.
pub fn synthesize(
    schema: Arc<Schema>,
    parent: Option<Arc<Implementation>>,
) -> Result<Implementation, SchemaError> {
    let mut accessors = HashMap::with_capacity(schema.local_descriptors().len());
    for descriptor in schema.local_descriptors() {
        let accessor = Accessor::plan(schema.id(), descriptor)?;
        accessors.insert(descriptor.key(), Arc::new(accessor));
    }

    Ok(Implementation {
        schema,
        parent,
        accessors,
        origin: Origin::Synthesized,
    })
}
