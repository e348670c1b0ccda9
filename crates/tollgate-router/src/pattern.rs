//! Path patterns for dispatch layers.
//!
//! Patterns are split into `/`-separated segments:
//!
//! | Segment | Matches |
//! |---|---|
//! | `users` | the literal segment |
//! | `{id}` or `:id` | any one segment, captured as `id` |
//! | `*rest` | every remaining segment, captured as `rest` |
//!
//! Verb routes must match the whole path. `use` routes match any path that
//! starts with the pattern on a segment boundary, so `/api` matches
//! `/api/users` but not `/apis`.

use tollgate_core::Params;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a route path.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments = split(path)
            .map(|segment| {
                if let Some(name) = segment.strip_prefix('*') {
                    Segment::CatchAll(name.to_string())
                } else if let Some(name) = segment.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if let Some(name) = segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();
        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// Returns the path as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches the whole path.
    #[must_use]
    pub fn match_exact(&self, path: &str) -> Option<Params> {
        self.match_path(path, false)
    }

    /// Matches a leading run of whole segments of the path.
    #[must_use]
    pub fn match_prefix(&self, path: &str) -> Option<Params> {
        self.match_path(path, true)
    }

    fn match_path(&self, path: &str, prefix: bool) -> Option<Params> {
        let mut params = Params::new();
        let mut remaining = split(path).peekable();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    let rest: Vec<&str> = remaining.collect();
                    params.push(name.as_str(), rest.join("/"));
                    // A catch-all must be the last segment.
                    return (index + 1 == self.segments.len()).then_some(params);
                }
                Segment::Literal(literal) => {
                    if remaining.next()? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = remaining.next()?;
                    params.push(name.as_str(), value);
                }
            }
        }

        (prefix || remaining.peek().is_none()).then_some(params)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_exact_match() {
        let pattern = PathPattern::parse("/users");
        assert!(pattern.match_exact("/users").is_some());
        assert!(pattern.match_exact("/users/").is_some());
        assert!(pattern.match_exact("/users/1").is_none());
        assert!(pattern.match_exact("/posts").is_none());
    }

    #[test]
    fn test_params_both_syntaxes() {
        let braces = PathPattern::parse("/orgs/{org}/users/{id}");
        let params = braces.match_exact("/orgs/acme/users/7").unwrap();
        assert_eq!(params.get("org"), Some("acme"));
        assert_eq!(params.get("id"), Some("7"));

        let colon = PathPattern::parse("/users/:id");
        assert_eq!(colon.match_exact("/users/9").unwrap().get("id"), Some("9"));
        assert!(colon.match_exact("/users").is_none());
    }

    #[test]
    fn test_catch_all() {
        let pattern = PathPattern::parse("/files/*path");
        let params = pattern.match_exact("/files/images/logo.png").unwrap();
        assert_eq!(params.get("path"), Some("images/logo.png"));
    }

    #[test]
    fn test_prefix_match_on_segment_boundary() {
        let pattern = PathPattern::parse("/api");
        assert!(pattern.match_prefix("/api").is_some());
        assert!(pattern.match_prefix("/api/users/1").is_some());
        assert!(pattern.match_prefix("/apis").is_none());

        let root = PathPattern::parse("/");
        assert!(root.match_prefix("/anything/at/all").is_some());
        assert!(root.match_exact("/").is_some());
    }

    #[test]
    fn test_as_str_keeps_registered_path() {
        assert_eq!(PathPattern::parse("/users/{id}").as_str(), "/users/{id}");
    }
}
