//! Response validation.

use tracing::{debug, warn};
use waymark_definition::Operation;

use crate::content::{self, BodyFormat};
use crate::engine::SchemaEngine;
use crate::error::{ErrorKind, ErrorSource, ResponseInvalid, ValidationError};
use crate::plan::ValidationPlan;
use crate::request::pointer_error;

/// Validates responses against a [`ValidationPlan`].
#[derive(Debug)]
pub struct ResponseValidator<'p, E: SchemaEngine> {
    plan: &'p ValidationPlan<E>,
}

impl<'p, E: SchemaEngine> ResponseValidator<'p, E> {
    pub(crate) fn new(plan: &'p ValidationPlan<E>) -> Self {
        Self { plan }
    }

    /// Checks a response's status, content type and body.
    ///
    /// The status is looked up exactly, then by class (`2XX`), then as
    /// `default`. A declared status without content accepts only an empty
    /// body.
    pub fn validate(
        &self,
        operation: &Operation,
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<(), ResponseInvalid> {
        let result = self.check(operation, status, content_type, body);
        match &result {
            Ok(()) => debug!(operation_id = %operation.operation_id(), status, "response valid"),
            Err(e) => warn!(
                operation_id = %operation.operation_id(),
                status,
                error = %e,
                "response does not match contract"
            ),
        }
        result
    }

    fn check(
        &self,
        operation: &Operation,
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<(), ResponseInvalid> {
        let operation_id = operation.operation_id();
        let Some((key, declared)) = operation.responses().lookup(status) else {
            return Err(ResponseInvalid::CodeNotFound {
                operation_id: operation_id.to_string(),
                status,
            });
        };

        let content_type_not_found = || ResponseInvalid::ContentTypeNotFound {
            operation_id: operation_id.to_string(),
            status,
            content_type: content_type.unwrap_or_default().to_string(),
        };

        if declared.content().is_empty() {
            return if body.is_empty() {
                Ok(())
            } else {
                Err(content_type_not_found())
            };
        }

        let (mime, media_type) = content::parse_content_type(content_type)
            .and_then(|mime| content::select(declared.content(), &mime).map(|key| (mime, key)))
            .ok_or_else(content_type_not_found)?;

        let Some(compiled) = self
            .plan
            .operation(operation_id)
            .and_then(|plan| plan.responses.get(&key))
            .and_then(|by_media| by_media.get(media_type))
            .and_then(Option::as_ref)
        else {
            return Ok(());
        };

        let body_invalid = |errors: Vec<ValidationError>| ResponseInvalid::BodyInvalid {
            operation_id: operation_id.to_string(),
            status,
            errors,
        };

        let schema = declared.content().get(media_type).and_then(Option::as_ref);
        let instance = content::parse_body(BodyFormat::of(&mime), body, schema, false).map_err(|message| {
            body_invalid(vec![ValidationError::new(
                ErrorSource::Pointer(String::new()),
                ErrorKind::MalformedBody,
                message,
            )])
        })?;

        let Some(instance) = instance else {
            return Ok(());
        };
        let violations = self.plan.engine().check(compiled, &instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(body_invalid(violations.into_iter().map(pointer_error).collect()))
        }
    }
}
