//! Schema declarations.
//!
//! A [`SchemaDecl`] is the statically known description of a shape: its
//! namespace-qualified name, its supertypes and its members. The resolver
//! turns a declaration into a validated [`Schema`](crate::Schema); the
//! derive macro emits declarations through the same builders.

use crate::adapter::AdapterRef;
use crate::descriptor::Operation;
use crate::number::Number;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a schema: its namespace-qualified name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(Arc<str>);

impl SchemaId {
    /// Build the id of `name` inside `namespace`.
    pub fn new(namespace: &str, name: &str) -> Self {
        if namespace.is_empty() {
            Self(Arc::from(name))
        } else {
            Self(Arc::from(format!("{namespace}.{name}")))
        }
    }

    /// The qualified name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaId({})", self.0)
    }
}

/// A reference to a schema declaration.
///
/// `Lazy` defers to a function so declarations can refer to themselves or
/// to schemas declared later (a `Node` with a `next: Node` property).
#[derive(Clone)]
pub enum SchemaRef {
    /// An already built declaration.
    Decl(Arc<SchemaDecl>),
    /// A declaration produced on demand.
    Lazy(fn() -> Arc<SchemaDecl>),
}

impl SchemaRef {
    /// Reference a declaration produced by `f`.
    pub const fn lazy(f: fn() -> Arc<SchemaDecl>) -> Self {
        SchemaRef::Lazy(f)
    }

    /// The declaration.
    pub fn decl(&self) -> Arc<SchemaDecl> {
        match self {
            SchemaRef::Decl(decl) => decl.clone(),
            SchemaRef::Lazy(f) => f(),
        }
    }

    /// The identity of the referenced schema.
    pub fn id(&self) -> SchemaId {
        match self {
            SchemaRef::Decl(decl) => decl.id(),
            SchemaRef::Lazy(f) => f().id(),
        }
    }
}

impl From<Arc<SchemaDecl>> for SchemaRef {
    fn from(decl: Arc<SchemaDecl>) -> Self {
        SchemaRef::Decl(decl)
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaRef({})", self.id())
    }
}

/// The declared type of a getter result or setter parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRef {
    /// `bool`.
    Bool,
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// `char`.
    Char,
    /// Nullable boolean.
    Boolean,
    /// Nullable number.
    Number,
    /// Nullable string.
    String,
    /// A nested object bound to the given schema.
    Object(SchemaRef),
    /// An array whose elements are bound to the given schema.
    ObjectArray(SchemaRef),
    /// A map whose values are bound to the given schema.
    ObjectMap(SchemaRef),
    /// A Rust type the store cannot hold directly; needs an adapter.
    Foreign {
        /// Type name, for diagnostics.
        name: &'static str,
        /// Type identity.
        id: TypeId,
    },
}

impl TypeRef {
    /// A foreign type reference for `T`.
    pub fn foreign<T: 'static>() -> Self {
        TypeRef::Foreign {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// The Rust type an accessor with this declaration reads or writes.
    ///
    /// `None` for object and container references, whose handle type is
    /// chosen by the caller.
    pub fn value_type_id(&self) -> Option<TypeId> {
        Some(match self {
            TypeRef::Bool => TypeId::of::<bool>(),
            TypeRef::I8 => TypeId::of::<i8>(),
            TypeRef::I16 => TypeId::of::<i16>(),
            TypeRef::I32 => TypeId::of::<i32>(),
            TypeRef::I64 => TypeId::of::<i64>(),
            TypeRef::F32 => TypeId::of::<f32>(),
            TypeRef::F64 => TypeId::of::<f64>(),
            TypeRef::Char => TypeId::of::<char>(),
            TypeRef::Boolean => TypeId::of::<Option<bool>>(),
            TypeRef::Number => TypeId::of::<Option<Number>>(),
            TypeRef::String => TypeId::of::<Option<String>>(),
            TypeRef::Foreign { id, .. } => *id,
            TypeRef::Object(_) | TypeRef::ObjectArray(_) | TypeRef::ObjectMap(_) => return None,
        })
    }

    /// Short human readable description.
    pub fn describe(&self) -> String {
        match self {
            TypeRef::Bool => "bool".into(),
            TypeRef::I8 => "i8".into(),
            TypeRef::I16 => "i16".into(),
            TypeRef::I32 => "i32".into(),
            TypeRef::I64 => "i64".into(),
            TypeRef::F32 => "f32".into(),
            TypeRef::F64 => "f64".into(),
            TypeRef::Char => "char".into(),
            TypeRef::Boolean => "Option<bool>".into(),
            TypeRef::Number => "Option<Number>".into(),
            TypeRef::String => "Option<String>".into(),
            TypeRef::Object(s) => format!("object {}", s.id()),
            TypeRef::ObjectArray(s) => format!("array of {}", s.id()),
            TypeRef::ObjectMap(s) => format!("map of {}", s.id()),
            TypeRef::Foreign { name, .. } => (*name).to_string(),
        }
    }
}

/// The property annotation of a member.
#[derive(Clone, Debug)]
pub struct PropertyAttr {
    /// Property key in the store.
    pub name: String,
    /// The operation the member performs.
    pub operation: Operation,
    /// Optional value adapter.
    pub adapter: Option<AdapterRef>,
}

/// One declared member of a schema.
#[derive(Clone, Debug)]
pub struct MemberDecl {
    method: String,
    property: Option<PropertyAttr>,
    params: Vec<TypeRef>,
    returns: Option<TypeRef>,
}

impl MemberDecl {
    /// A member with no annotation, parameters or result.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            property: None,
            params: Vec::new(),
            returns: None,
        }
    }

    /// A `Get` member returning `ty`.
    pub fn getter(method: impl Into<String>, name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(method).property(name, Operation::Get).returns(ty)
    }

    /// A `Set` member taking `ty`.
    pub fn setter(method: impl Into<String>, name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(method).property(name, Operation::Set).param(ty)
    }

    /// A `Has` member.
    pub fn has(method: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(method)
            .property(name, Operation::Has)
            .returns(TypeRef::Bool)
    }

    /// An `IsNull` member.
    pub fn is_null(method: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(method)
            .property(name, Operation::IsNull)
            .returns(TypeRef::Bool)
    }

    /// A `Delete` member.
    pub fn delete(method: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(method)
            .property(name, Operation::Delete)
            .returns(TypeRef::Bool)
    }

    /// Annotate the member with a property operation.
    pub fn property(mut self, name: impl Into<String>, operation: Operation) -> Self {
        let adapter = self.property.take().and_then(|p| p.adapter);
        self.property = Some(PropertyAttr {
            name: name.into(),
            operation,
            adapter,
        });
        self
    }

    /// Attach a value adapter to the property annotation.
    ///
    /// Has no effect on a member without a property annotation.
    pub fn adapter(mut self, adapter: AdapterRef) -> Self {
        if let Some(property) = self.property.as_mut() {
            property.adapter = Some(adapter);
        }
        self
    }

    /// Append a parameter.
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Set the result type.
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.returns = Some(ty);
        self
    }

    /// The member name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The property annotation, if any.
    pub fn property_attr(&self) -> Option<&PropertyAttr> {
        self.property.as_ref()
    }

    /// Declared parameter types.
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Declared result type.
    pub fn result(&self) -> Option<&TypeRef> {
        self.returns.as_ref()
    }
}

/// A schema declaration.
#[derive(Clone, Debug)]
pub struct SchemaDecl {
    namespace: String,
    name: String,
    supertypes: Vec<SchemaRef>,
    members: Vec<MemberDecl>,
}

impl SchemaDecl {
    /// Start declaring `name` inside `namespace`.
    pub fn builder(namespace: impl Into<String>, name: impl Into<String>) -> SchemaDeclBuilder {
        SchemaDeclBuilder {
            decl: SchemaDecl {
                namespace: namespace.into(),
                name: name.into(),
                supertypes: Vec::new(),
                members: Vec::new(),
            },
        }
    }

    /// The namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The qualified identity.
    pub fn id(&self) -> SchemaId {
        SchemaId::new(&self.namespace, &self.name)
    }

    /// Declared supertypes.
    pub fn supertypes(&self) -> &[SchemaRef] {
        &self.supertypes
    }

    /// Declared members, in declaration order.
    pub fn members(&self) -> &[MemberDecl] {
        &self.members
    }
}

/// Builder for [`SchemaDecl`].
#[derive(Debug)]
pub struct SchemaDeclBuilder {
    decl: SchemaDecl,
}

impl SchemaDeclBuilder {
    /// Add a supertype.
    pub fn extends(mut self, parent: impl Into<SchemaRef>) -> Self {
        self.decl.supertypes.push(parent.into());
        self
    }

    /// Add a member.
    pub fn member(mut self, member: MemberDecl) -> Self {
        self.decl.members.push(member);
        self
    }

    /// Add a `Get`/`Set` pair for `name` with methods `name` and `set_name`.
    pub fn property(self, name: &str, ty: TypeRef) -> Self {
        self.member(MemberDecl::getter(name, name, ty.clone()))
            .member(MemberDecl::setter(format!("set_{name}"), name, ty))
    }

    /// Finish the declaration.
    pub fn build(self) -> Arc<SchemaDecl> {
        Arc::new(self.decl)
    }
}
