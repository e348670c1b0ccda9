//! The ordered, shared list of active interceptors.
//!
//! A [`HandlerRegistry`] is created once by the composition root and shared
//! (through an `Arc`) by every pipeline proxy. Mutation is visible to passes
//! that are already running: a pass re-reads the registry at each step, so
//! an interceptor added mid-request participates in the remaining steps.

use crate::interceptor::Interceptor;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::debug;

/// A shared interceptor handle.
pub type SharedInterceptor = Arc<dyn Interceptor>;

/// Ordered list of active interceptors.
///
/// # Example
///
/// ```
/// use tollgate_pipeline::{HandlerRegistry, Interceptor};
///
/// struct Audit;
/// impl Interceptor for Audit {
///     fn name(&self) -> &str { "Audit" }
/// }
///
/// let registry = HandlerRegistry::new();
/// registry.add(Audit);
/// registry.add(Audit);
/// assert_eq!(registry.len(), 2);
///
/// assert_eq!(registry.remove("Audit"), 2);
/// assert!(registry.is_empty());
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    pipeline: RwLock<Vec<SharedInterceptor>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor.
    pub fn add(&self, interceptor: impl Interceptor) {
        self.add_shared(Arc::new(interceptor));
    }

    /// Appends an already-shared interceptor. The same instance may be added
    /// more than once; it then runs once per entry.
    pub fn add_shared(&self, interceptor: SharedInterceptor) {
        let name = interceptor.name().to_string();
        self.pipeline.write().push(interceptor);
        debug!(interceptor = %name, "Policy handler is registered");
    }

    /// Removes every interceptor with the given name, returning how many
    /// were removed. An empty name removes nothing.
    pub fn remove(&self, name: &str) -> usize {
        if name.is_empty() {
            return 0;
        }
        let removed = {
            let mut pipeline = self.pipeline.write();
            let before = pipeline.len();
            pipeline.retain(|interceptor| interceptor.name() != name);
            before - pipeline.len()
        };
        if removed > 0 {
            debug!(interceptor = %name, removed, "Policy handler is unregistered");
        }
        removed
    }

    /// Returns a live read view of the registry.
    ///
    /// The view holds a read lock: registry mutation blocks until it is
    /// dropped. Do not hold it across an await point.
    pub fn list(&self) -> MappedRwLockReadGuard<'_, [SharedInterceptor]> {
        RwLockReadGuard::map(self.pipeline.read(), |pipeline| pipeline.as_slice())
    }

    /// Returns a point-in-time copy of the registry.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SharedInterceptor> {
        self.pipeline.read().clone()
    }

    /// Returns the interceptor at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<SharedInterceptor> {
        self.pipeline.read().get(index).cloned()
    }

    /// Returns the interceptor names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.pipeline
            .read()
            .iter()
            .map(|interceptor| interceptor.name().to_string())
            .collect()
    }

    /// Returns the number of registered interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipeline.read().len()
    }

    /// Returns true if no interceptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipeline.read().is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("interceptors", &self.names())
            .finish()
    }
}
