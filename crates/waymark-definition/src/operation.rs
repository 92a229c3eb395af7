//! Operations: one HTTP method on one path template.

use http::Method;
use waymark_router::PathTemplate;

use crate::parameter::{Parameter, ParameterLocation};
use crate::responses::{RequestBody, Responses};

/// A single operation of the contract.
///
/// Parameters declared on the path item are already merged in, with
/// operation-level declarations taking precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub(crate) operation_id: String,
    pub(crate) method: Method,
    pub(crate) template: PathTemplate,
    pub(crate) summary: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) deprecated: bool,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) request_body: Option<RequestBody>,
    pub(crate) responses: Responses,
}

impl Operation {
    /// Returns the operation ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the parsed path template.
    #[must_use]
    pub fn path_template(&self) -> &PathTemplate {
        &self.template
    }

    /// Returns the path template as written in the contract.
    #[must_use]
    pub fn path(&self) -> &str {
        self.template.as_str()
    }

    /// Returns the summary, if any.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns true if the operation is marked deprecated.
    #[must_use]
    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    /// Returns every parameter declaration.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the parameters carried at `location`.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location() == location)
    }

    /// Returns the path parameters.
    pub fn path_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters_in(ParameterLocation::Path)
    }

    /// Returns the query parameters.
    pub fn query_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters_in(ParameterLocation::Query)
    }

    /// Returns the header parameters.
    pub fn header_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters_in(ParameterLocation::Header)
    }

    /// Returns the cookie parameters.
    pub fn cookie_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters_in(ParameterLocation::Cookie)
    }

    /// Returns the request body declaration, if any.
    #[must_use]
    pub fn request_body(&self) -> Option<&RequestBody> {
        self.request_body.as_ref()
    }

    /// Returns the declared responses.
    #[must_use]
    pub fn responses(&self) -> &Responses {
        &self.responses
    }
}

/// Merges path-item parameters with operation parameters.
///
/// An operation declaration replaces a path-item declaration with the same
/// name and location.
pub(crate) fn merge_parameters(path_level: &[Parameter], operation_level: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = path_level
        .iter()
        .filter(|inherited| !operation_level.iter().any(|own| own.same_as(inherited)))
        .cloned()
        .collect();
    merged.extend(operation_level);
    merged
}
