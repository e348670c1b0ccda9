//! Registration verbs and endpoint descriptors.

use http::Method;
use serde::{Deserialize, Serialize};

/// A registration verb supported by the policy router.
///
/// [`Verb::All`] is the generic "use" registration: it matches every method
/// under a path prefix and is recorded with method `ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// `OPTIONS`
    Options,
    /// `SEARCH`
    Search,
    /// `use` registration, recorded as `ALL`.
    All,
}

impl Verb {
    /// Returns the upper-cased method name recorded in endpoint descriptors.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Search => "SEARCH",
            Self::All => "ALL",
        }
    }

    /// Returns true if this verb matches the given request method.
    #[must_use]
    pub fn matches(self, method: &Method) -> bool {
        match self {
            Self::All => true,
            other => method.as_str() == other.method_name(),
        }
    }

    /// Returns all verbs in registration-surface order.
    #[must_use]
    pub const fn all() -> [Verb; 8] {
        [
            Self::Get,
            Self::Put,
            Self::Post,
            Self::Delete,
            Self::Patch,
            Self::Options,
            Self::Search,
            Self::All,
        ]
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method_name())
    }
}

/// A recorded route registration, used for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Route name taken from the bindings, if any.
    pub name: Option<String>,
    /// The registered path.
    pub path: String,
    /// Upper-cased verb name (`ALL` for `use`).
    pub method: String,
}

impl EndpointDescriptor {
    /// Creates a descriptor for a registration.
    #[must_use]
    pub fn new(name: Option<String>, path: impl Into<String>, verb: Verb) -> Self {
        Self {
            name,
            path: path.into(),
            method: verb.method_name().to_string(),
        }
    }
}
