//! Validation settings.

use serde::{Deserialize, Serialize};

/// Settings applied by [`ValidationPlan`](crate::ValidationPlan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Accept undeclared query parameters without error. They are still
    /// dropped from the validated output.
    pub allow_additional_parameters: bool,

    /// Convert parameter strings to the type their schema declares.
    pub coerce_parameters: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allow_additional_parameters: false,
            coerce_parameters: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValidationConfig::default();
        assert!(!config.allow_additional_parameters);
        assert!(config.coerce_parameters);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"allow_additional_parameters": true}"#).unwrap();
        assert!(config.allow_additional_parameters);
        assert!(config.coerce_parameters);

        assert!(serde_json::from_str::<ValidationConfig>(r#"{"strict": true}"#).is_err());
    }
}
