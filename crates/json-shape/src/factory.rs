//! Shape factory.
//!
//! The public entry point: binds a schema's implementation to a new or
//! existing store value. Configuration is programmatic, through
//! [`ShapeFactory::builder`].

use crate::decl::SchemaRef;
use crate::error::{ShapeError, ShapeResult};
use crate::object::ShapeObject;
use crate::registry::ImplementationRegistry;
use crate::shape::ShapeHandle;
use crate::store::{BackingStore, MemoryStore, StoreHandle};
use std::sync::Arc;

struct FactoryInner {
    registry: Arc<ImplementationRegistry>,
    store: Arc<dyn BackingStore>,
}

/// Creates typed handles over store values.
///
/// Cheap to clone; clones share the registry and store.
#[derive(Clone)]
pub struct ShapeFactory {
    inner: Arc<FactoryInner>,
}

impl ShapeFactory {
    /// A factory over `store` using the process-wide registry.
    pub fn new(store: impl BackingStore + 'static) -> Self {
        Self::builder().store(store).build()
    }

    /// A factory over the in-memory store using the process-wide registry.
    pub fn memory() -> Self {
        Self::new(MemoryStore)
    }

    /// Start configuring a factory.
    pub fn builder() -> ShapeFactoryBuilder {
        ShapeFactoryBuilder::default()
    }

    /// The registry implementations come from.
    pub fn registry(&self) -> &Arc<ImplementationRegistry> {
        &self.inner.registry
    }

    /// The store fresh values come from.
    pub fn store(&self) -> &dyn BackingStore {
        &*self.inner.store
    }

    /// Create `H` over a fresh store value.
    pub fn create<H: ShapeHandle>(&self) -> ShapeResult<H> {
        self.create_dynamic(&H::schema(), None).map(H::from_object)
    }

    /// Create `H` over an existing store value.
    pub fn create_with<H: ShapeHandle>(&self, value: StoreHandle) -> ShapeResult<H> {
        self.create_dynamic(&H::schema(), Some(value))
            .map(H::from_object)
    }

    /// Bind `schema` to `value`, or to a fresh value when `None`.
    ///
    /// Fresh values are arrays for array schemas and objects otherwise.
    pub fn create_dynamic(
        &self,
        schema: &SchemaRef,
        value: Option<StoreHandle>,
    ) -> ShapeResult<ShapeObject> {
        let implementation = self.inner.registry.get_or_synthesize(schema)?;
        let value = match value {
            Some(value) => value,
            None if implementation.is_array() => self
                .inner
                .store
                .new_array()
                .map_err(|e| ShapeError::store("new_array", e))?,
            None => self
                .inner
                .store
                .new_object()
                .map_err(|e| ShapeError::store("new_object", e))?,
        };
        Ok(ShapeObject::new(implementation, value, self.clone()))
    }
}

impl std::fmt::Debug for ShapeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeFactory")
            .field("store", &self.inner.store.name())
            .field("registry", &self.inner.registry)
            .finish()
    }
}

/// Builder for [`ShapeFactory`].
///
/// Defaults to [`MemoryStore`] and [`ImplementationRegistry::global`].
#[derive(Default)]
pub struct ShapeFactoryBuilder {
    store: Option<Arc<dyn BackingStore>>,
    registry: Option<Arc<ImplementationRegistry>>,
}

impl ShapeFactoryBuilder {
    /// Use `store` for fresh values.
    pub fn store(mut self, store: impl BackingStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Use an already shared store.
    pub fn shared_store(mut self, store: Arc<dyn BackingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a private registry instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<ImplementationRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the factory.
    pub fn build(self) -> ShapeFactory {
        ShapeFactory {
            inner: Arc::new(FactoryInner {
                registry: self.registry.unwrap_or_else(ImplementationRegistry::global),
                store: self.store.unwrap_or_else(|| Arc::new(MemoryStore)),
            }),
        }
    }
}
