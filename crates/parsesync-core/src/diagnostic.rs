//! Diagnostics emitted during a reconciliation run
//!
//! Skipped destructive actions are reported here as warnings, never as
//! errors. Diagnostic codes are stable identifiers written into run reports;
//! add new codes, do not rename existing ones.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A remote-only field was kept because field deletion is disabled
    FieldDeletionSkipped,

    /// A changed field was left as-is because it would need drop-and-recreate
    FieldRecreateSkipped,

    /// A remote-only class was kept because class deletion is disabled
    ClassDeletionSkipped,
}

impl DiagnosticCode {
    /// Stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldDeletionSkipped => "FIELD_DELETION_SKIPPED",
            Self::FieldRecreateSkipped => "FIELD_RECREATE_SKIPPED",
            Self::ClassDeletionSkipped => "CLASS_DELETION_SKIPPED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A warning attached to a class and optionally a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,

    /// Human-readable message
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            class_name: None,
            field_name: None,
        }
    }

    /// Warning for a remote-only field left in place
    pub fn skipped_field_deletion(class_name: &str, field_name: &str) -> Self {
        Self::new(
            DiagnosticCode::FieldDeletionSkipped,
            format!("Field '{field_name}' of class '{class_name}' was not deleted (field deletion disabled)"),
        )
        .with_class(class_name)
        .with_field(field_name)
    }

    /// Warning for a changed field that could not be recreated
    pub fn skipped_field_recreate(class_name: &str, field_name: &str) -> Self {
        Self::new(
            DiagnosticCode::FieldRecreateSkipped,
            format!(
                "Field '{field_name}' of class '{class_name}' differs from the remote definition \
                 but was not recreated (field deletion disabled)"
            ),
        )
        .with_class(class_name)
        .with_field(field_name)
    }

    /// Warning for a remote-only class left in place
    pub fn skipped_class_deletion(class_name: &str) -> Self {
        Self::new(
            DiagnosticCode::ClassDeletionSkipped,
            format!("Class '{class_name}' was not deleted (class deletion disabled)"),
        )
        .with_class(class_name)
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_field(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        assert_eq!(DiagnosticCode::FieldDeletionSkipped.as_str(), "FIELD_DELETION_SKIPPED");
        assert_eq!(DiagnosticCode::ClassDeletionSkipped.as_str(), "CLASS_DELETION_SKIPPED");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::skipped_field_deletion("Post", "legacy");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("FIELD_DELETION_SKIPPED"));
        assert!(!json.contains("severity"));
        assert!(json.contains("\"field_name\":\"legacy\""));
    }
}
