//! Named target handlers for manifest-driven registration.

use std::collections::HashMap;
use tollgate_core::{StepHandler, TollgateError, TollgateResult};

/// Maps handler names used in route manifests to target handlers.
///
/// # Example
///
/// ```
/// use tollgate_core::{step_fn, Exchange, Next};
/// use tollgate_router::HandlerTable;
///
/// let table = HandlerTable::new().with(
///     "health",
///     step_fn(|exchange: Exchange, _next: Next| async move {
///         let _ = exchange.end("ok").await;
///     }),
/// );
///
/// assert!(table.resolve("health").is_ok());
/// assert!(table.resolve("missing").is_err());
/// ```
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, StepHandler>,
}

impl HandlerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler, replacing any handler with the same name.
    pub fn insert(&mut self, name: impl Into<String>, handler: StepHandler) {
        self.handlers.insert(name.into(), handler);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, handler: StepHandler) -> Self {
        self.insert(name, handler);
        self
    }

    /// Looks up a handler by name.
    ///
    /// # Errors
    ///
    /// Returns [`TollgateError::InvalidArgument`] if no handler has that name.
    pub fn resolve(&self, name: &str) -> TollgateResult<StepHandler> {
        self.handlers.get(name).cloned().ok_or_else(|| {
            TollgateError::invalid_argument("handler", format!("no handler named '{name}'"))
        })
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("handlers", &self.names())
            .finish()
    }
}
