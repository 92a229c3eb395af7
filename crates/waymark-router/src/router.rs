//! High-level router API.
//!
//! [`Router`] owns the segment tree and turns a `(method, path)` pair into a
//! [`RouteOutcome`].

use http::Method;
use percent_encoding::percent_decode_str;

use crate::method_table::{MethodTable, RouteConflict, RouteEntry};
use crate::node::{Bindings, Candidate, Node};
use crate::params::Params;
use crate::template::PathTemplate;
use crate::{MatchOptions, RouteMatch, RouteOutcome};

/// Segment tree router over contract path templates.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use waymark_router::{PathTemplate, RouteOutcome, Router};
///
/// let mut router = Router::new();
/// router.insert(&PathTemplate::parse("/pets").unwrap(), Method::GET, "listPets").unwrap();
/// router.insert(&PathTemplate::parse("/pets/{petId}").unwrap(), Method::GET, "showPetById").unwrap();
///
/// match router.match_route(&Method::GET, "/pets/1") {
///     RouteOutcome::Matched(m) => {
///         assert_eq!(m.operation_id, "showPetById");
///         assert_eq!(m.params.get("petId"), Some("1"));
///     }
///     other => panic!("unexpected outcome: {other:?}"),
/// }
///
/// assert!(matches!(
///     router.match_route(&Method::DELETE, "/pets"),
///     RouteOutcome::MethodNotAllowed { .. }
/// ));
/// assert!(matches!(router.match_route(&Method::GET, "/unknown"), RouteOutcome::NotFound));
/// ```
///
/// # Route Priority
///
/// Literal segments win over placeholders at the same position, so
/// `/pets/mine` is preferred over `/pets/{id}` for the path `/pets/mine`.
#[derive(Debug, Clone, Default)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `operation_id` for `method` on `template`.
    pub fn insert(
        &mut self,
        template: &PathTemplate,
        method: Method,
        operation_id: impl Into<String>,
    ) -> Result<(), RouteConflict> {
        let entry = RouteEntry::new(
            operation_id,
            template.as_str(),
            template.param_names().map(str::to_string),
        );
        self.root
            .descend_mut(template.segments())
            .methods_mut()
            .insert(method, entry)?;
        self.route_count += 1;
        Ok(())
    }

    /// Matches with default [`MatchOptions`].
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteOutcome<'_> {
        self.match_route_with(method, path, &MatchOptions::default())
    }

    /// Matches `method` and `path` against the registered templates.
    #[must_use]
    pub fn match_route_with(
        &self,
        method: &Method,
        path: &str,
        options: &MatchOptions,
    ) -> RouteOutcome<'_> {
        let segments = split_path(path, options.allow_empty_parameters);
        let outcome = self.outcome_for(method, &segments, options);

        // "/pets/" is still "/pets" when empty segments are significant.
        if matches!(outcome, RouteOutcome::NotFound)
            && options.allow_empty_parameters
            && segments.last().is_some_and(String::is_empty)
        {
            return self.outcome_for(method, &segments[..segments.len() - 1], options);
        }
        outcome
    }

    /// Returns the method table and bindings of the best path match,
    /// ignoring the method.
    #[must_use]
    pub fn match_path(&self, path: &str, options: &MatchOptions) -> Option<(&MethodTable, Params)> {
        let segments = split_path(path, options.allow_empty_parameters);
        let candidates = self.candidates(&segments, options.allow_empty_parameters, true);
        let candidate = candidates.into_iter().next()?;
        let table = candidate.node.methods();
        let params = table
            .iter()
            .next()
            .map(|(_, entry)| bind(entry, &candidate, &segments))
            .unwrap_or_default();
        Some((table, params))
    }

    fn outcome_for(
        &self,
        method: &Method,
        segments: &[String],
        options: &MatchOptions,
    ) -> RouteOutcome<'_> {
        let candidates = self.candidates(
            segments,
            options.allow_empty_parameters,
            !options.method_fallthrough,
        );
        let Some(best) = candidates.first() else {
            return RouteOutcome::NotFound;
        };

        let chosen = if options.method_fallthrough {
            candidates
                .iter()
                .find_map(|c| c.node.methods().get(method).map(|entry| (c, entry)))
        } else {
            best.node.methods().get(method).map(|entry| (best, entry))
        };

        match chosen {
            Some((candidate, entry)) => RouteOutcome::Matched(RouteMatch {
                operation_id: entry.operation_id(),
                template: entry.template(),
                params: bind(entry, candidate, segments),
            }),
            None => {
                let mut allowed: Vec<Method> = Vec::new();
                for candidate in &candidates {
                    for method in candidate.node.methods().allowed_methods() {
                        if !allowed.contains(&method) {
                            allowed.push(method);
                        }
                    }
                }
                RouteOutcome::MethodNotAllowed { allowed }
            }
        }
    }

    fn candidates(&self, segments: &[String], allow_empty: bool, first_only: bool) -> Vec<Candidate<'_>> {
        let mut out = Vec::new();
        self.root.collect(
            segments,
            0,
            allow_empty,
            &mut Bindings::new(),
            first_only,
            &mut out,
        );
        out
    }

    /// Returns the root of the segment tree.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

fn bind(entry: &RouteEntry, candidate: &Candidate<'_>, segments: &[String]) -> Params {
    entry
        .param_names()
        .iter()
        .zip(candidate.bound.iter())
        .map(|(name, &position)| (name.clone(), segments[position].clone()))
        .collect()
}

/// Splits a request path into percent-decoded segments.
///
/// Anything after `?` is ignored. Empty segments are dropped unless
/// `keep_empty` is set.
pub(crate) fn split_path(path: &str, keep_empty: bool) -> Vec<String> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return Vec::new();
    }

    path.split('/')
        .filter(|s| keep_empty || !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect()
}

/// Strips a mount prefix from `path` on a segment boundary.
///
/// Returns `None` when `path` is not under `prefix`. An empty prefix or `/`
/// strips nothing.
///
/// ```rust
/// use waymark_router::strip_mount_prefix;
///
/// assert_eq!(strip_mount_prefix("/api/pets", "/api"), Some("/pets"));
/// assert_eq!(strip_mount_prefix("/api", "/api/"), Some("/"));
/// assert_eq!(strip_mount_prefix("/apix/pets", "/api"), None);
/// ```
#[must_use]
pub fn strip_mount_prefix<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }

    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') || rest.starts_with('?') {
        Some(rest)
    } else {
        None
    }
}
