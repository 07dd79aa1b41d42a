//! Errors raised by reconciliation runs

use parsesync_catalog::ServiceError;
use parsesync_core::{ConfigError, RequestKind, SourceError};

/// Coarse classification of a [`SyncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed connection settings; nothing was sent
    ConfigInvalid,
    /// Malformed local schema; nothing was sent
    LocalSchemaInvalid,
    /// Network or credential failure
    RemoteUnreachable,
    /// The service refused a request
    RemoteRejected,
    /// Writing exported schema files failed
    ExportFailed,
}

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid local schema: {0}")]
    LocalSchema(#[from] SourceError),

    #[error("Failed to fetch remote schema from {service}: {source}")]
    Fetch {
        service: &'static str,
        #[source]
        source: ServiceError,
    },

    /// A mutation failed; the `applied` earlier requests of the run stand
    #[error("{kind} request for class '{class_name}' failed after {applied} successful request(s): {source}")]
    Request {
        kind: RequestKind,
        class_name: String,
        applied: usize,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to write exported schema: {0}")]
    Export(#[source] SourceError),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::ConfigInvalid,
            Self::LocalSchema(_) => ErrorKind::LocalSchemaInvalid,
            Self::Fetch { source, .. } | Self::Request { source, .. } => match source {
                ServiceError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
                ServiceError::Unauthorized(_)
                | ServiceError::Unreachable(_)
                | ServiceError::InvalidResponse(_) => ErrorKind::RemoteUnreachable,
            },
            Self::Export(_) => ErrorKind::ExportFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = SyncError::Request {
            kind: RequestKind::Delete,
            class_name: "Post".to_string(),
            applied: 2,
            source: ServiceError::RemoteRejected {
                status: 400,
                code: Some(255),
                message: "not empty".to_string(),
            },
        };
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        assert!(err.to_string().starts_with("delete request for class 'Post' failed after 2"));

        let err = SyncError::Fetch {
            service: "Mock",
            source: ServiceError::Unauthorized("bad key".to_string()),
        };
        assert_eq!(err.kind(), ErrorKind::RemoteUnreachable);

        let err = SyncError::from(ConfigError::MissingField("app_id"));
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
