//! Implementation registry.
//!
//! Maps each [`SchemaId`] to its implementation, computed at most once per
//! registry. Concurrent first requests for the same schema block on a
//! per-schema `OnceLock` cell, so exactly one of them resolves and
//! synthesizes while the rest wait for the shared result. The map lock
//! itself is only held to look up or insert a cell.

use crate::collections::builtin;
use crate::decl::{SchemaId, SchemaRef};
use crate::error::{SchemaError, ShapeError, ShapeResult};
use crate::resolver;
use crate::synth::{self, Implementation, StaticImplementation};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

type Cell = Arc<OnceLock<Result<Arc<Implementation>, SchemaError>>>;

/// Compute-once store of schema implementations.
pub struct ImplementationRegistry {
    cells: Mutex<HashMap<SchemaId, Cell>>,
    statics: RwLock<HashMap<SchemaId, StaticImplementation>>,
    synthesized: AtomicUsize,
}

impl Default for ImplementationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImplementationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImplementationRegistry")
            .field("len", &self.len())
            .field("synthesized", &self.synthesis_count())
            .finish()
    }
}

impl ImplementationRegistry {
    /// A registry holding only the built-in static implementations.
    pub fn new() -> Self {
        let statics = builtin::all()
            .iter()
            .map(|decl| (decl.id(), StaticImplementation::new()))
            .collect();
        Self {
            cells: Mutex::new(HashMap::new()),
            statics: RwLock::new(statics),
            synthesized: AtomicUsize::new(0),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ImplementationRegistry> {
        static GLOBAL: OnceLock<Arc<ImplementationRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(ImplementationRegistry::new()))
            .clone()
    }

    /// Use `implementation` instead of synthesis for `schema`.
    ///
    /// Must happen before the schema is first requested, even if that
    /// request is still in flight; descendants are still synthesized on top
    /// of it.
    pub fn register_static(
        &self,
        schema: &SchemaRef,
        implementation: StaticImplementation,
    ) -> ShapeResult<()> {
        let id = schema.id();
        // Held until the insert so no first request can slip in between.
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        if cells.contains_key(&id) {
            return Err(ShapeError::AlreadyRegistered { schema: id });
        }

        let mut statics = self.statics.write().unwrap_or_else(PoisonError::into_inner);
        if statics.contains_key(&id) {
            return Err(ShapeError::AlreadyRegistered { schema: id });
        }
        statics.insert(id, implementation);
        drop(statics);
        drop(cells);
        Ok(())
    }

    /// Return the implementation of `schema`, building it on first use.
    ///
    /// Parents are materialized first. A rejected declaration is cached and
    /// the same error is returned on every later call.
    pub fn get_or_synthesize(
        &self,
        schema: &SchemaRef,
    ) -> Result<Arc<Implementation>, SchemaError> {
        let id = schema.id();
        let cell = self.cell(&id);
        cell.get_or_init(|| self.materialize(schema, &id)).clone()
    }

    /// The root object implementation.
    pub fn root(&self) -> Result<Arc<Implementation>, SchemaError> {
        self.get_or_synthesize(&builtin::json_object_ref())
    }

    /// An already materialized implementation.
    pub fn get(&self, id: &SchemaId) -> Option<Arc<Implementation>> {
        self.cell_if_present(id)
            .and_then(|cell| cell.get().cloned())
            .and_then(Result::ok)
    }

    /// Number of schemas materialized or being materialized.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been materialized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many implementations the synthesizer has built.
    ///
    /// Static implementations are not counted.
    pub fn synthesis_count(&self) -> usize {
        self.synthesized.load(Ordering::SeqCst)
    }

    fn cell(&self, id: &SchemaId) -> Cell {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.entry(id.clone()).or_default().clone()
    }

    fn cell_if_present(&self, id: &SchemaId) -> Option<Cell> {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn materialize(
        &self,
        schema: &SchemaRef,
        id: &SchemaId,
    ) -> Result<Arc<Implementation>, SchemaError> {
        match self.build(schema, id) {
            Ok(implementation) => {
                tracing::debug!(
                    schema = %id,
                    accessors = implementation.local_len(),
                    origin = ?implementation.origin(),
                    "materialized shape implementation"
                );
                Ok(Arc::new(implementation))
            }
            Err(e) => {
                tracing::warn!(schema = %id, error = %e, "rejected shape declaration");
                Err(e)
            }
        }
    }

    fn build(&self, schema: &SchemaRef, id: &SchemaId) -> Result<Implementation, SchemaError> {
        let decl = schema.decl();
        let parent = match resolver::declared_parent(&decl)? {
            Some(parent) => Some(self.get_or_synthesize(&parent)?),
            None if *id == builtin::json_object().id() => None,
            None => Some(self.root()?),
        };

        let resolved = Arc::new(resolver::resolve(
            decl,
            parent.as_ref().map(|p| p.schema().clone()),
        )?);

        let statics = self.statics.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(implementation) = statics.get(id) {
            return Implementation::from_static(resolved, parent, implementation);
        }
        drop(statics);

        let implementation = synth::synthesize(resolved, parent)?;
        self.synthesized.fetch_add(1, Ordering::SeqCst);
        Ok(implementation)
    }
}
