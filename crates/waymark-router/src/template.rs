//! Path template parsing.
//!
//! A template such as `/pets/{petId}/photos` is split into an ordered list of
//! [`Segment`]s. Placeholders must occupy a whole segment.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A literal segment that must match the request segment exactly.
    Literal(String),
    /// A named placeholder (`{petId}`) that binds any request segment.
    Param(String),
}

impl Segment {
    /// Returns true for placeholder segments.
    #[must_use]
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }
}

/// Errors raised while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template does not start with `/`.
    #[error("path template '{template}' must start with '/'")]
    MissingLeadingSlash {
        /// The offending template.
        template: String,
    },

    /// A placeholder is unterminated or has stray braces.
    #[error("unbalanced braces in segment '{segment}'")]
    Unbalanced {
        /// The offending segment.
        segment: String,
    },

    /// A placeholder has no name (`{}`).
    #[error("empty parameter name in segment '{segment}'")]
    EmptyName {
        /// The offending segment.
        segment: String,
    },

    /// A placeholder shares its segment with literal text (`{id}.json`).
    #[error("parameter must span the whole segment, got '{segment}'")]
    PartialSegment {
        /// The offending segment.
        segment: String,
    },

    /// The same placeholder name appears twice.
    #[error("parameter '{name}' appears more than once")]
    RepeatedName {
        /// The repeated name.
        name: String,
    },
}

/// A parsed path template.
///
/// # Example
///
/// ```rust
/// use waymark_router::{PathTemplate, Segment};
///
/// let template: PathTemplate = "/pets/{petId}".parse().unwrap();
/// assert_eq!(template.segments().len(), 2);
/// assert_eq!(template.segments()[1], Segment::Param("petId".to_string()));
/// assert_eq!(template.param_names().collect::<Vec<_>>(), vec!["petId"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses a template string.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(TemplateError::MissingLeadingSlash {
                template: raw.to_string(),
            });
        };

        let mut segments: Vec<Segment> = Vec::new();
        for part in rest.split('/').filter(|s| !s.is_empty()) {
            let segment = Self::parse_segment(part)?;
            if let Segment::Param(name) = &segment {
                if segments.iter().any(|s| matches!(s, Segment::Param(n) if n == name)) {
                    return Err(TemplateError::RepeatedName { name: name.clone() });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    fn parse_segment(part: &str) -> Result<Segment, TemplateError> {
        let opens = part.matches('{').count();
        let closes = part.matches('}').count();

        if opens == 0 && closes == 0 {
            return Ok(Segment::Literal(part.to_string()));
        }
        if opens != 1 || closes != 1 {
            return Err(TemplateError::Unbalanced {
                segment: part.to_string(),
            });
        }

        match part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some("") => Err(TemplateError::EmptyName {
                segment: part.to_string(),
            }),
            Some(name) => Ok(Segment::Param(name.to_string())),
            None if part.find('{') < part.find('}') => Err(TemplateError::PartialSegment {
                segment: part.to_string(),
            }),
            None => Err(TemplateError::Unbalanced {
                segment: part.to_string(),
            }),
        }
    }

    /// Returns the template exactly as written in the contract.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns placeholder names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns true if the template declares the named placeholder.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.param_names().any(|n| n == name)
    }

    /// Returns the shape of this template with placeholder names erased.
    ///
    /// Two templates with the same shape match exactly the same request paths.
    #[must_use]
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(text) => shape.push_str(text),
                Segment::Param(_) => shape.push_str("{}"),
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static() {
        let template = PathTemplate::parse("/pets/mine").unwrap();
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("pets".to_string()),
                Segment::Literal("mine".to_string())
            ]
        );
        assert_eq!(template.param_names().count(), 0);
    }

    #[test]
    fn test_parse_params() {
        let template = PathTemplate::parse("/orgs/{orgId}/users/{userId}").unwrap();
        assert_eq!(
            template.param_names().collect::<Vec<_>>(),
            vec!["orgId", "userId"]
        );
        assert!(template.has_param("orgId"));
        assert!(!template.has_param("id"));
    }

    #[test]
    fn test_parse_root() {
        let template = PathTemplate::parse("/").unwrap();
        assert!(template.segments().is_empty());
        assert_eq!(template.shape(), "/");
    }

    #[test]
    fn test_shape_erases_names() {
        let a = PathTemplate::parse("/pets/{id}").unwrap();
        let b = PathTemplate::parse("/pets/{petId}/").unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.shape(), "/pets/{}");
    }

    #[test]
    fn test_missing_slash() {
        assert!(matches!(
            PathTemplate::parse("pets"),
            Err(TemplateError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_malformed_segments() {
        assert!(matches!(
            PathTemplate::parse("/pets/{id"),
            Err(TemplateError::Unbalanced { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/pets/{}"),
            Err(TemplateError::EmptyName { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/pets/{id}.json"),
            Err(TemplateError::PartialSegment { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/pets/}id{"),
            Err(TemplateError::Unbalanced { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/a/{id}/b/{id}"),
            Err(TemplateError::RepeatedName { .. })
        ));
    }

    #[test]
    fn test_display_keeps_raw() {
        let template: PathTemplate = "/pets/{petId}/".parse().unwrap();
        assert_eq!(template.to_string(), "/pets/{petId}/");
    }
}
