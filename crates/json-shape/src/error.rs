//! Error types for json-shape operations.

use crate::decl::SchemaId;
use crate::descriptor::MethodKey;
use thiserror::Error;

/// Result type alias for json-shape operations.
pub type ShapeResult<T> = Result<T, ShapeError>;

/// Result type alias for backing store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors in a schema declaration.
///
/// These are fatal to the schema they name. The registry caches them and
/// hands the same error to every later request for that schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The declaration carries no namespace.
    #[error("schema {schema} is not declared inside a namespace")]
    NotNamespaced {
        /// The offending schema.
        schema: SchemaId,
    },

    /// The declaration lists more than one supertype.
    #[error("schema {schema} must extend at most one schema, found {count}")]
    MultipleSupertypes {
        /// The offending schema.
        schema: SchemaId,
        /// Number of declared supertypes.
        count: usize,
    },

    /// The supertype chain loops back on itself.
    #[error("schema {schema} has a cyclic supertype chain")]
    CyclicSupertypes {
        /// The schema at which the cycle was detected.
        schema: SchemaId,
    },

    /// A member has a signature that does not fit its declared operation.
    #[error("invalid member {schema}::{member}: {reason}")]
    InvalidSignature {
        /// The declaring schema.
        schema: SchemaId,
        /// The member name.
        member: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two members map to the same property name and operation.
    #[error("duplicate {operation} accessor for property '{property}' in {schema} (member {member})")]
    DuplicateMember {
        /// The declaring schema.
        schema: SchemaId,
        /// The member that collided.
        member: String,
        /// The property name.
        property: String,
        /// The operation.
        operation: crate::descriptor::Operation,
    },

    /// An adapter converts to a type the store cannot hold.
    #[error("adapter {adapter} on {schema}::{member} converts to unsupported type {property_type}")]
    UnsupportedAdapterKind {
        /// The declaring schema.
        schema: SchemaId,
        /// The member name.
        member: String,
        /// The adapter type name.
        adapter: &'static str,
        /// The adapter's property type name.
        property_type: &'static str,
    },
}

impl SchemaError {
    /// Create an invalid signature error.
    #[inline]
    pub fn invalid_signature(
        schema: &SchemaId,
        member: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidSignature {
            schema: schema.clone(),
            member: member.into(),
            reason: reason.into(),
        }
    }

    /// The schema the error is reported against.
    pub fn schema(&self) -> &SchemaId {
        match self {
            SchemaError::NotNamespaced { schema }
            | SchemaError::MultipleSupertypes { schema, .. }
            | SchemaError::CyclicSupertypes { schema }
            | SchemaError::InvalidSignature { schema, .. }
            | SchemaError::DuplicateMember { schema, .. }
            | SchemaError::UnsupportedAdapterKind { schema, .. } => schema,
        }
    }
}

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A property or element holds a value of a different kind.
    #[error("type mismatch at '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Property name or element index.
        key: String,
        /// The expected kind.
        expected: &'static str,
        /// The kind found.
        found: &'static str,
    },

    /// Array index is out of bounds.
    #[error("index {index} out of bounds (len: {len})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The actual length of the array.
        len: usize,
    },

    /// An array cannot grow to the requested length.
    #[error("cannot grow array to {requested} elements")]
    CapacityExceeded {
        /// The requested length.
        requested: usize,
    },

    /// Nesting a value inside itself or one of its descendants.
    #[error("{operation} would make a value contain itself")]
    CyclicValue {
        /// The attempted operation.
        operation: &'static str,
    },

    /// An array operation on an object value.
    #[error("{operation} requires an array value")]
    NotAnArray {
        /// The attempted operation.
        operation: &'static str,
    },

    /// A property operation on an array value.
    #[error("{operation} requires an object value")]
    NotAnObject {
        /// The attempted operation.
        operation: &'static str,
    },

    /// A value handle that belongs to a different store.
    #[error("value handle does not belong to the {store} store")]
    ForeignValue {
        /// Name of the receiving store.
        store: &'static str,
    },

    /// The store's internal lock was poisoned.
    #[error("store lock poisoned")]
    Poisoned,

    /// Any other failure reported by a store implementation.
    #[error("backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(key: impl ToString, expected: &'static str, found: &'static str) -> Self {
        StoreError::TypeMismatch {
            key: key.to_string(),
            expected,
            found,
        }
    }

    /// Wrap an arbitrary backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// Errors that can occur while creating or using shapes.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// The schema declaration was rejected.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A cast to an unrelated schema.
    #[error("cannot cast {from} to {to}")]
    Cast {
        /// The schema of the instance.
        from: SchemaId,
        /// The requested schema.
        to: SchemaId,
    },

    /// A backing store failure, with the store's error as the source.
    #[error("backing store failure during {operation}")]
    Store {
        /// The protocol operation that failed.
        operation: &'static str,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },

    /// The implementation has no accessor for the requested operation.
    #[error("{schema} declares no accessor {key}")]
    UnknownAccessor {
        /// The instance schema.
        schema: SchemaId,
        /// The requested operation and property.
        key: MethodKey,
    },

    /// A dynamic value of the wrong kind.
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch {
        /// The expected value kind.
        expected: &'static str,
        /// The value kind supplied.
        found: &'static str,
    },

    /// A hand-written implementation registered too late.
    #[error("schema {schema} already has an implementation")]
    AlreadyRegistered {
        /// The schema.
        schema: SchemaId,
    },
}

impl ShapeError {
    /// Create a cast error.
    #[inline]
    pub fn cast(from: &SchemaId, to: &SchemaId) -> Self {
        ShapeError::Cast {
            from: from.clone(),
            to: to.clone(),
        }
    }

    /// Wrap a store error raised by `operation`.
    #[inline]
    pub fn store(operation: &'static str, source: StoreError) -> Self {
        ShapeError::Store { operation, source }
    }

    /// Create a value mismatch error.
    #[inline]
    pub fn value_mismatch(expected: &'static str, found: &'static str) -> Self {
        ShapeError::ValueMismatch { expected, found }
    }

    /// True for cast failures.
    pub fn is_cast(&self) -> bool {
        matches!(self, ShapeError::Cast { .. })
    }
}
