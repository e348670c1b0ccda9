//! Per-route binding metadata.
//!
//! Every registered route carries a [`Bindings`] value: a name used in logs
//! and endpoint introspection, an optional security section naming the
//! required auth scheme, and any number of free-form keys that interceptors
//! may consult.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Security requirements attached to a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityBinding {
    /// Name of the auth scheme the route requires (for example `BasicAuth`).
    pub auth: String,
}

/// Binding metadata for a registered route.
///
/// # Example
///
/// ```
/// use tollgate_core::Bindings;
///
/// let bindings = Bindings::named("listUsers").with_auth("BasicAuth");
/// assert_eq!(bindings.name(), Some("listUsers"));
/// assert_eq!(bindings.auth_scheme(), Some("BasicAuth"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    /// Route name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Security requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityBinding>,

    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bindings {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates bindings with a route name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Requires the given auth scheme on the route.
    #[must_use]
    pub fn with_auth(mut self, scheme: impl Into<String>) -> Self {
        self.security = Some(SecurityBinding {
            auth: scheme.into(),
        });
        self
    }

    /// Sets a free-form key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns the route name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the required auth scheme.
    #[must_use]
    pub fn auth_scheme(&self) -> Option<&str> {
        self.security.as_ref().map(|s| s.auth.as_str())
    }

    /// Looks up a free-form key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_extra_keys() {
        let bindings: Bindings = serde_json::from_str(
            r#"{"name": "getUser", "security": {"auth": "BasicAuth"}, "cache": true}"#,
        )
        .unwrap();

        assert_eq!(bindings.name(), Some("getUser"));
        assert_eq!(bindings.auth_scheme(), Some("BasicAuth"));
        assert_eq!(bindings.get("cache"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_empty_bindings() {
        let bindings = Bindings::new();
        assert!(bindings.name().is_none());
        assert!(bindings.auth_scheme().is_none());
        assert_eq!(serde_json::to_string(&bindings).unwrap(), "{}");
    }

    #[test]
    fn test_builder() {
        let bindings = Bindings::named("x").with("ttl", 30);
        assert_eq!(bindings.get("ttl"), Some(&Value::from(30)));
    }
}
