//! Registered-route introspection.

use parking_lot::RwLock;
use tollgate_core::EndpointDescriptor;

/// Append-only record of every route registered through a policy router.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: RwLock<Vec<EndpointDescriptor>>,
}

impl EndpointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a registration.
    pub fn record(&self, descriptor: EndpointDescriptor) {
        self.endpoints.write().push(descriptor);
    }

    /// Returns an independent copy of every recorded descriptor.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EndpointDescriptor> {
        self.endpoints.read().clone()
    }

    /// Returns the number of recorded registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }
}
