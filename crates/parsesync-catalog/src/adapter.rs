//! Schema service trait for reading and mutating a remote schema

use parsesync_core::{ClassSchema, ClassUpdate, SchemaSet};

/// Errors returned by a schema service
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// Credentials were refused
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The service could not be reached (connection, DNS, timeout)
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// The service refused a specific request
    #[error("Request rejected (HTTP {status}{}): {message}", .code.map(|c| format!(", code {c}")).unwrap_or_default())]
    RemoteRejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// A success response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for services that hold a live class schema
///
/// Each mutation method is exactly one administrative request.
#[async_trait::async_trait]
pub trait SchemaService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &'static str;

    /// Fetch every class the service currently knows about
    async fn fetch_schemas(&self) -> Result<SchemaSet, ServiceError>;

    /// Create a class with its full definition
    async fn create_class(&self, class: &ClassSchema) -> Result<(), ServiceError>;

    /// Apply a partial update to an existing class
    async fn update_class(&self, update: &ClassUpdate) -> Result<(), ServiceError>;

    /// Delete a class
    async fn delete_class(&self, class_name: &str) -> Result<(), ServiceError>;
}
