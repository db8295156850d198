//! Error types for the policy engine crate.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("no such field: {0}")]
    UnknownField(String),
    #[error("no groups in section {0:?}")]
    EmptySection(String),
    #[error("unsupported policy version: {0:?}")]
    UnsupportedVersion(String),
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("section {section:?} mixes runtime field categories: {categories}")]
    MixedRuntimeCategories { section: String, categories: String },
    #[error("field {field} is not available on {kind} objects")]
    FieldNotAvailable { field: String, kind: String },
    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidQueryValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("{backend} evaluator construction failed: {reason}")]
    EvaluatorConstruction { backend: String, reason: String },
    #[error("augmentation error: {0}")]
    Augmentation(String),
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("YAML parsing error: {0}")]
    Yaml(String),
    #[error("JSON parsing error: {0}")]
    Json(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl PolicyError {
    pub(crate) fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PolicyError::InvalidQueryValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors that indicate a malformed policy rather than a
    /// failure inside the engine.
    pub fn is_policy_malformed(&self) -> bool {
        matches!(
            self,
            PolicyError::UnknownField(_)
                | PolicyError::EmptySection(_)
                | PolicyError::UnsupportedVersion(_)
                | PolicyError::InvalidPolicy(_)
                | PolicyError::MixedRuntimeCategories { .. }
                | PolicyError::FieldNotAvailable { .. }
                | PolicyError::InvalidQueryValue { .. }
                | PolicyError::Validation(_)
        )
    }
}

impl From<serde_yaml::Error> for PolicyError {
    fn from(err: serde_yaml::Error) -> Self {
        PolicyError::Yaml(err.to_string())
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::Json(err.to_string())
    }
}

impl From<std::io::Error> for PolicyError {
    fn from(err: std::io::Error) -> Self {
        PolicyError::Io(err.to_string())
    }
}

/// Every problem found while validating a policy.
///
/// Validation never stops at the first defect, so this carries one message per
/// defect in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }

    /// Converts into `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy validation failed: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PolicyError::UnknownField("Bogus".to_string());
        assert_eq!(format!("{err}"), "no such field: Bogus");

        let err = PolicyError::UnsupportedVersion("x.y.z".to_string());
        assert_eq!(format!("{err}"), "unsupported policy version: \"x.y.z\"");

        let err = PolicyError::FieldNotAvailable {
            field: "Process Name".to_string(),
            kind: "image".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "field Process Name is not available on image objects"
        );

        let err = PolicyError::invalid_value("CVSS", "abc", "not a number");
        assert_eq!(
            format!("{err}"),
            "invalid value \"abc\" for CVSS: not a number"
        );
    }

    #[test]
    fn test_validation_errors_aggregate() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(errors.clone().into_result().is_ok());

        errors.push("first");
        errors.push("second");
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "policy validation failed: first; second"
        );

        let err: PolicyError = errors.clone().into();
        assert!(err.is_policy_malformed());
        assert_eq!(err.to_string(), errors.to_string());
    }

    #[test]
    fn test_error_conversions() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PolicyError = io_err.into();
        assert!(matches!(err, PolicyError::Io(_)));
        assert!(!err.is_policy_malformed());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PolicyError = json_err.into();
        assert!(matches!(err, PolicyError::Json(_)));

        let yaml_err = serde_yaml::from_str::<Vec<String>>("a: [").unwrap_err();
        let err: PolicyError = yaml_err.into();
        assert!(matches!(err, PolicyError::Yaml(_)));
    }
}
