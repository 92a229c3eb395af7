//! Path parameters bound during a route match.
//!
//! Values are stored as percent-decoded strings in template order. Type
//! coercion is left to request validation.

use smallvec::SmallVec;

/// Parameters stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Path parameters extracted from a matched request path.
///
/// # Example
///
/// ```rust
/// use waymark_router::Params;
///
/// let mut params = Params::new();
/// params.push("petId", "42");
///
/// assert_eq!(params.get("petId"), Some("42"));
/// assert_eq!(params.get("ownerId"), None);
/// assert_eq!(params.names().collect::<Vec<_>>(), vec!["petId"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value to a parameter name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(n, _)| n == name)
    }

    /// Returns true if no parameters are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterates over the bound names in template order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(n, _)| n.as_str())
    }

    /// Consumes the set, returning owned pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.inner.into_vec()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
        assert!(!params.contains("id"));
    }

    #[test]
    fn test_params_keep_template_order() {
        let mut params = Params::new();
        params.push("orgId", "acme");
        params.push("userId", "7");

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("orgId", "acme"), ("userId", "7")]);
        assert_eq!(params.into_pairs()[1], ("userId".to_string(), "7".to_string()));
    }

    #[test]
    fn test_params_spill_past_inline_capacity() {
        let params: Params = (0..10)
            .map(|i| (format!("p{i}"), format!("v{i}")))
            .collect();

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("p9"), Some("v9"));
    }

    #[test]
    fn test_params_borrowed_iteration() {
        let mut params = Params::new();
        params.push("a", "1");

        let mut seen = Vec::new();
        for (name, value) in &params {
            seen.push(format!("{name}={value}"));
        }
        assert_eq!(seen, vec!["a=1"]);
    }
}
