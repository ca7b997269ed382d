//! Schema resolution.
//!
//! Turns a [`SchemaDecl`] into a validated [`Schema`]: checks the namespace
//! and supertype rules, classifies every member into a
//! [`PropertyDescriptor`] and rejects name and operation collisions across
//! the whole inheritance chain.

use crate::decl::{SchemaDecl, SchemaId, SchemaRef};
use crate::descriptor::{MethodKey, Operation, PropertyDescriptor};
use crate::error::SchemaError;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// A resolved schema: local descriptors plus the resolved parent.
#[derive(Debug)]
pub struct Schema {
    id: SchemaId,
    decl: Arc<SchemaDecl>,
    parent: Option<Arc<Schema>>,
    local: Vec<PropertyDescriptor>,
}

impl Schema {
    /// The schema identity.
    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    /// The declaration this schema was resolved from.
    pub fn decl(&self) -> &Arc<SchemaDecl> {
        &self.decl
    }

    /// The resolved parent, `None` only for the root.
    pub fn parent(&self) -> Option<&Arc<Schema>> {
        self.parent.as_ref()
    }

    /// Descriptors declared by this schema itself.
    pub fn local_descriptors(&self) -> &[PropertyDescriptor] {
        &self.local
    }

    /// All descriptors, root ancestor first.
    pub fn effective_descriptors(&self) -> Vec<&PropertyDescriptor> {
        let mut out = self
            .parent
            .as_ref()
            .map(|p| p.effective_descriptors())
            .unwrap_or_default();
        out.extend(self.local.iter());
        out
    }

    /// Look up a descriptor here or in an ancestor.
    pub fn descriptor(&self, key: &MethodKey) -> Option<&PropertyDescriptor> {
        self.local
            .iter()
            .find(|d| d.operation == key.operation && d.name == key.name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.descriptor(key)))
    }

    /// Ancestor chain starting with this schema.
    pub fn ancestry(&self) -> impl Iterator<Item = &Schema> {
        std::iter::successors(Some(self), |s| s.parent.as_deref())
    }

    /// Whether `id` is this schema or one of its ancestors.
    pub fn is_descendant_of(&self, id: &SchemaId) -> bool {
        self.ancestry().any(|s| &s.id == id)
    }

    /// Serializable description of the effective descriptor set.
    pub fn summary(&self) -> SchemaSummary {
        let mut descriptors = Vec::new();
        for schema in self.ancestry().collect::<Vec<_>>().into_iter().rev() {
            let inherited = schema.id != self.id;
            descriptors.extend(schema.local.iter().map(|d| DescriptorSummary {
                name: d.name.clone(),
                method: d.method.clone(),
                operation: d.operation,
                kind: d.value_kind.as_ref().map(|k| k.label()),
                adapter: d.adapter.as_ref().map(|a| a.name()),
                declared_in: schema.id.to_string(),
                inherited,
            }));
        }
        SchemaSummary {
            id: self.id.to_string(),
            parent: self.parent.as_ref().map(|p| p.id.to_string()),
            descriptors,
        }
    }
}

/// Serializable schema description.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
    /// Qualified schema name.
    pub id: String,
    /// Qualified parent name.
    pub parent: Option<String>,
    /// Effective descriptors, root ancestor first.
    pub descriptors: Vec<DescriptorSummary>,
}

/// Serializable descriptor description.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorSummary {
    /// Property key.
    pub name: String,
    /// Declaring member.
    pub method: String,
    /// The operation.
    pub operation: Operation,
    /// Value kind label, absent for predicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Adapter type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<&'static str>,
    /// Schema that declares the member.
    pub declared_in: String,
    /// Whether the member comes from an ancestor.
    pub inherited: bool,
}

fn check_header(decl: &SchemaDecl) -> Result<(), SchemaError> {
    if decl.namespace().trim().is_empty() {
        return Err(SchemaError::NotNamespaced { schema: decl.id() });
    }
    if decl.supertypes().len() > 1 {
        return Err(SchemaError::MultipleSupertypes {
            schema: decl.id(),
            count: decl.supertypes().len(),
        });
    }
    Ok(())
}

/// Validate the header of `decl` and return its declared parent.
///
/// Fails with [`SchemaError::CyclicSupertypes`] when following first
/// supertypes leads back to `decl`. Loops further up the chain are left
/// for the schema that closes them.
pub fn declared_parent(decl: &SchemaDecl) -> Result<Option<SchemaRef>, SchemaError> {
    check_header(decl)?;
    let Some(parent) = decl.supertypes().first() else {
        return Ok(None);
    };

    let id = decl.id();
    let mut seen = HashSet::from([id.clone()]);
    let mut next = Some(parent.clone());
    while let Some(current) = next {
        let current = current.decl();
        let current_id = current.id();
        if current_id == id {
            return Err(SchemaError::CyclicSupertypes { schema: id });
        }
        if !seen.insert(current_id) {
            break;
        }
        next = current.supertypes().first().cloned();
    }
    Ok(Some(parent.clone()))
}

/// Resolve `decl` against its already resolved `parent`.
pub fn resolve(decl: Arc<SchemaDecl>, parent: Option<Arc<Schema>>) -> Result<Schema, SchemaError> {
    check_header(&decl)?;
    let id = decl.id();

    let mut seen = HashSet::new();
    let mut local = Vec::with_capacity(decl.members().len());
    for member in decl.members() {
        let descriptor = PropertyDescriptor::classify(&id, member)?;
        let key = descriptor.key();
        let inherited = parent.as_ref().is_some_and(|p| p.descriptor(&key).is_some());
        if inherited || !seen.insert(key) {
            return Err(SchemaError::DuplicateMember {
                schema: id,
                member: descriptor.method,
                property: descriptor.name,
                operation: descriptor.operation,
            });
        }
        local.push(descriptor);
    }

    Ok(Schema {
        id,
        decl,
        parent,
        local,
    })
}
