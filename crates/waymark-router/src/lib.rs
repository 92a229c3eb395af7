//! Segment tree router for contract path templates.
//!
//! Every path template declared in a contract (`/pets/{petId}`) is inserted
//! once per HTTP method. A request path is then resolved to the operation it
//! belongs to, together with the values bound to each placeholder.
//!
//! # Features
//!
//! - **Literal priority**: `/pets/mine` wins over `/pets/{id}` for `/pets/mine`
//! - **Backtracking**: a dead-end literal branch falls back to a placeholder
//! - **Method outcomes**: a path hit with the wrong method reports the allowed methods
//! - **Percent-decoding**: bound values are decoded per segment
//! - **Conflict detection**: two templates of the same shape and method are rejected
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use waymark_router::{PathTemplate, RouteOutcome, Router};
//!
//! let mut router = Router::new();
//! router.insert(&PathTemplate::parse("/pets").unwrap(), Method::GET, "listPets").unwrap();
//! router.insert(&PathTemplate::parse("/pets").unwrap(), Method::POST, "createPets").unwrap();
//! router.insert(&PathTemplate::parse("/pets/{petId}").unwrap(), Method::GET, "showPetById").unwrap();
//!
//! let outcome = router.match_route(&Method::GET, "/pets/42");
//! let route = outcome.matched().unwrap();
//! assert_eq!(route.operation_id, "showPetById");
//! assert_eq!(route.params.get("petId"), Some("42"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!                    "pets"
//!                [GET, POST]
//!                      │
//!                   {param}
//!                    [GET]
//! ```
//!
//! Templates whose shapes differ only in placeholder names share a node.
//! Each method entry keeps its own names, so `/pets/{id}` (GET) and
//! `/pets/{petId}` (DELETE) bind under the names their own template uses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod method_table;
mod node;
mod params;
mod router;
mod template;

use http::Method;

pub use method_table::{MethodTable, RouteConflict, RouteEntry};
pub use node::Node;
pub use params::Params;
pub use router::{strip_mount_prefix, Router};
pub use template::{PathTemplate, Segment, TemplateError};

/// A matched route with its operation ID and bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The operation ID of the matched route
    pub operation_id: &'a str,
    /// The template as written in the contract
    pub template: &'a str,
    /// Percent-decoded placeholder values
    pub params: Params,
}

/// The result of resolving a request against the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome<'a> {
    /// A route matched both path and method.
    Matched(RouteMatch<'a>),
    /// The path matched, but not for this method.
    MethodNotAllowed {
        /// Methods registered for the matching path(s)
        allowed: Vec<Method>,
    },
    /// No template matches the path.
    NotFound,
}

impl<'a> RouteOutcome<'a> {
    /// Returns true for [`RouteOutcome::Matched`].
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// Returns the match, if any.
    #[must_use]
    pub fn matched(self) -> Option<RouteMatch<'a>> {
        match self {
            Self::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the allowed methods for a method mismatch.
    #[must_use]
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            Self::MethodNotAllowed { allowed } => Some(allowed),
            _ => None,
        }
    }
}

/// Knobs for [`Router::match_route_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    /// Lets placeholders bind empty segments (`/pets//toys`).
    pub allow_empty_parameters: bool,
    /// On a method mismatch, keep searching lower-priority templates that
    /// declare the method.
    pub method_fallthrough: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn petstore() -> Router {
        let mut router = Router::new();
        for (template, method, op) in [
            ("/pets", Method::GET, "listPets"),
            ("/pets", Method::POST, "createPets"),
            ("/pets/{petId}", Method::GET, "showPetById"),
            ("/orgs/{orgId}/users/{userId}", Method::GET, "getOrgUser"),
        ] {
            router
                .insert(&PathTemplate::parse(template).unwrap(), method, op)
                .unwrap();
        }
        router
    }

    #[test]
    fn test_basic_routing() {
        let router = petstore();

        let m = router.match_route(&Method::GET, "/pets").matched().unwrap();
        assert_eq!(m.operation_id, "listPets");
        assert!(m.params.is_empty());

        let m = router.match_route(&Method::POST, "/pets").matched().unwrap();
        assert_eq!(m.operation_id, "createPets");
    }

    #[test]
    fn test_multiple_params() {
        let router = petstore();
        let m = router
            .match_route(&Method::GET, "/orgs/acme/users/123")
            .matched()
            .unwrap();
        assert_eq!(m.operation_id, "getOrgUser");
        assert_eq!(m.params.get("orgId"), Some("acme"));
        assert_eq!(m.params.get("userId"), Some("123"));
    }

    #[test]
    fn test_outcome_helpers() {
        let router = petstore();

        let outcome = router.match_route(&Method::DELETE, "/pets");
        assert!(!outcome.is_matched());
        assert_eq!(outcome.allowed_methods(), Some(&[Method::GET, Method::POST][..]));

        let outcome = router.match_route(&Method::GET, "/toys");
        assert_eq!(outcome, RouteOutcome::NotFound);
        assert!(outcome.allowed_methods().is_none());
    }

    proptest! {
        #[test]
        fn test_param_binds_any_segment(value in "[A-Za-z0-9._~-]{1,24}") {
            let router = petstore();
            let path = format!("/pets/{value}");
            let outcome = router.match_route(&Method::GET, &path);
            let m = outcome.matched().unwrap();
            prop_assert_eq!(m.operation_id, "showPetById");
            prop_assert_eq!(m.params.get("petId"), Some(value.as_str()));
        }

        #[test]
        fn test_matching_is_deterministic(path in "(/[a-z{}0-9]{0,6}){0,4}") {
            let router = petstore();
            let first = router.match_route(&Method::GET, &path);
            let second = router.match_route(&Method::GET, &path);
            prop_assert_eq!(first, second);
        }
    }
}
