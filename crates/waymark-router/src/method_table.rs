//! Per-path method dispatch.
//!
//! Every terminal node in the tree owns a [`MethodTable`] mapping HTTP
//! methods to the [`RouteEntry`] registered for them. Templates of the same
//! shape share a node, so the entry carries its own placeholder names.

use http::Method;
use smallvec::SmallVec;
use thiserror::Error;

/// A route registered for one method on one path shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    operation_id: String,
    template: String,
    param_names: SmallVec<[String; 4]>,
}

impl RouteEntry {
    /// Creates a route entry.
    #[must_use]
    pub fn new(
        operation_id: impl Into<String>,
        template: impl Into<String>,
        param_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            template: template.into(),
            param_names: param_names.into_iter().collect(),
        }
    }

    /// Returns the operation ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the template the entry was registered with.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns placeholder names in template order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

/// Raised when a route is registered twice for the same method and shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{method} {template} ({operation_id}) is ambiguous with {existing_template} ({existing_operation_id})"
)]
pub struct RouteConflict {
    /// HTTP method of the rejected route.
    pub method: Method,
    /// Template of the rejected route.
    pub template: String,
    /// Operation ID of the rejected route.
    pub operation_id: String,
    /// Template already registered for the same method and shape.
    pub existing_template: String,
    /// Operation ID already registered for the same method and shape.
    pub existing_operation_id: String,
}

/// Maps HTTP methods to route entries for a single path shape.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use waymark_router::{MethodTable, RouteEntry};
///
/// let mut table = MethodTable::new();
/// table.insert(Method::GET, RouteEntry::new("listPets", "/pets", Vec::<String>::new())).unwrap();
/// table.insert(Method::POST, RouteEntry::new("createPet", "/pets", Vec::<String>::new())).unwrap();
///
/// assert_eq!(table.get_operation(&Method::GET), Some("listPets"));
/// assert_eq!(table.get_operation(&Method::DELETE), None);
/// assert_eq!(table.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    entries: SmallVec<[(Method, RouteEntry); 2]>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entry` for `method`.
    ///
    /// Fails if the method already has an entry: two templates of identical
    /// shape and method cannot be told apart at request time.
    pub fn insert(&mut self, method: Method, entry: RouteEntry) -> Result<(), RouteConflict> {
        if let Some(existing) = self.get(&method) {
            return Err(RouteConflict {
                method,
                template: entry.template,
                operation_id: entry.operation_id,
                existing_template: existing.template.clone(),
                existing_operation_id: existing.operation_id.clone(),
            });
        }
        self.entries.push((method, entry));
        Ok(())
    }

    /// Returns the entry registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, entry)| entry)
    }

    /// Returns the operation ID registered for `method`.
    #[must_use]
    pub fn get_operation(&self, method: &Method) -> Option<&str> {
        self.get(method).map(RouteEntry::operation_id)
    }

    /// Returns the registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Iterates over `(method, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &RouteEntry)> {
        self.entries.iter().map(|(m, e)| (m, e))
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: &str) -> RouteEntry {
        RouteEntry::new(op, "/pets/{id}", ["id".to_string()])
    }

    #[test]
    fn test_method_table_empty() {
        let table = MethodTable::new();
        assert!(table.is_empty());
        assert!(table.allowed_methods().is_empty());
    }

    #[test]
    fn test_method_table_lookup() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, entry("showPet")).unwrap();
        table.insert(Method::DELETE, entry("deletePet")).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get_operation(&Method::GET), Some("showPet"));
        assert_eq!(table.get_operation(&Method::DELETE), Some("deletePet"));
        assert_eq!(table.get_operation(&Method::PUT), None);
        assert_eq!(table.get(&Method::GET).unwrap().param_names(), ["id"]);
    }

    #[test]
    fn test_method_table_rejects_duplicate_method() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, entry("showPet")).unwrap();

        let err = table
            .insert(
                Method::GET,
                RouteEntry::new("showPetAgain", "/pets/{petId}", ["petId".to_string()]),
            )
            .unwrap_err();

        assert_eq!(err.existing_operation_id, "showPet");
        assert_eq!(err.operation_id, "showPetAgain");
        assert!(err.to_string().contains("ambiguous"));
        assert_eq!(table.get_operation(&Method::GET), Some("showPet"));
    }

    #[test]
    fn test_method_table_extension_methods() {
        let custom = Method::from_bytes(b"PURGE").unwrap();
        let mut table = MethodTable::new();
        table.insert(custom.clone(), entry("purgePet")).unwrap();

        assert_eq!(table.get_operation(&custom), Some("purgePet"));
        assert_eq!(table.allowed_methods(), vec![custom]);
    }
}
